use crate::error::OptimizeError;
use std::collections::HashSet;
use ts_algebra::{Algebra, Expr};
use ts_common::limits::MAX_DEPTH;
use ts_common::Statistics;
use ts_dictionary::Dictionary;
use ts_model::{Term, TermOrVariable, TriplePattern, Variable};

/// Rewrites every `Bgp` node in the tree to a greedy most-selective-first
/// pattern order, per §4.3.
pub fn reorder_bgps(
    tree: &Algebra,
    stats: &Statistics,
    dict: &dyn Dictionary,
) -> Result<Algebra, OptimizeError> {
    let range_vars = range_filtered_variables(tree);
    reorder_at_depth(tree, stats, dict, &range_vars, 0)
}

fn reorder_at_depth(
    tree: &Algebra,
    stats: &Statistics,
    dict: &dyn Dictionary,
    range_vars: &HashSet<Variable>,
    depth: usize,
) -> Result<Algebra, OptimizeError> {
    if depth > MAX_DEPTH {
        return Err(OptimizeError::TooDeeplyNested);
    }
    let next = depth + 1;
    let recurse = |t: &Algebra| reorder_at_depth(t, stats, dict, range_vars, next);

    Ok(match tree {
        Algebra::Bgp(patterns) => Algebra::Bgp(order_patterns(patterns, stats, dict, range_vars)),
        Algebra::Join(l, r) => Algebra::Join(Box::new(recurse(l)?), Box::new(recurse(r)?)),
        Algebra::LeftJoin(l, r, expr) => {
            Algebra::LeftJoin(Box::new(recurse(l)?), Box::new(recurse(r)?), expr.clone())
        }
        Algebra::Minus(l, r) => Algebra::Minus(Box::new(recurse(l)?), Box::new(recurse(r)?)),
        Algebra::Union(l, r) => Algebra::Union(Box::new(recurse(l)?), Box::new(recurse(r)?)),
        Algebra::Filter(expr, inner) => Algebra::Filter(expr.clone(), Box::new(recurse(inner)?)),
        Algebra::Extend(inner, var, expr) => {
            Algebra::Extend(Box::new(recurse(inner)?), var.clone(), expr.clone())
        }
        Algebra::Group(inner, keys, aggs) => {
            Algebra::Group(Box::new(recurse(inner)?), keys.clone(), aggs.clone())
        }
        Algebra::Project(inner, vars) => Algebra::Project(Box::new(recurse(inner)?), vars.clone()),
        Algebra::Distinct(inner) => Algebra::Distinct(Box::new(recurse(inner)?)),
        Algebra::Reduced(inner) => Algebra::Reduced(Box::new(recurse(inner)?)),
        Algebra::OrderBy(inner, keys) => Algebra::OrderBy(Box::new(recurse(inner)?), keys.clone()),
        Algebra::Slice(inner, offset, limit) => {
            Algebra::Slice(Box::new(recurse(inner)?), *offset, *limit)
        }
        Algebra::Service(target, inner, silent) => {
            Algebra::Service(target.clone(), Box::new(recurse(inner)?), *silent)
        }
        Algebra::Graph(target, inner) => Algebra::Graph(target.clone(), Box::new(recurse(inner)?)),
        Algebra::Values(..) | Algebra::Path(..) => tree.clone(),
    })
}

/// Greedy most-selective-first ordering: maintains the set of variables
/// bound by already-placed patterns, and at each step picks the remaining
/// pattern with the lowest score, ties broken by original index.
fn order_patterns(
    patterns: &[TriplePattern],
    stats: &Statistics,
    dict: &dyn Dictionary,
    range_vars: &HashSet<Variable>,
) -> Vec<TriplePattern> {
    let mut remaining: Vec<(usize, &TriplePattern)> = patterns.iter().enumerate().collect();
    let mut bound: HashSet<Variable> = HashSet::new();
    let mut ordered = Vec::with_capacity(patterns.len());

    while !remaining.is_empty() {
        let (best_pos, _) = remaining
            .iter()
            .enumerate()
            .map(|(pos, (idx, pattern))| {
                let score = pattern_score(pattern, &bound, stats, dict, range_vars);
                (pos, (*idx, score))
            })
            .min_by(|(_, (idx_a, score_a)), (_, (idx_b, score_b))| {
                score_a
                    .partial_cmp(score_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(idx_a.cmp(idx_b))
            })
            .expect("remaining is non-empty");

        let (_, chosen) = remaining.remove(best_pos);
        for var in chosen.variables() {
            bound.insert(var.clone());
        }
        ordered.push(chosen.clone());
    }
    ordered
}

fn pattern_score(
    pattern: &TriplePattern,
    bound: &HashSet<Variable>,
    stats: &Statistics,
    dict: &dyn Dictionary,
    range_vars: &HashSet<Variable>,
) -> f64 {
    let subject = position_score(&pattern.subject, bound, Position::Subject, stats, dict);
    let predicate = position_score(&pattern.predicate, bound, Position::Predicate, stats, dict);
    let object = position_score(&pattern.object, bound, Position::Object, stats, dict);
    let mut score = subject * predicate * object;

    if let TermOrVariable::Term(Term::NamedNode(predicate_iri)) = &pattern.predicate {
        let has_range_filtered_var = [&pattern.subject, &pattern.object].iter().any(|pos| {
            matches!(pos, TermOrVariable::Variable(v) if range_vars.contains(v))
        });
        if has_range_filtered_var {
            let has_range_index = dict
                .resolve(&Term::NamedNode(predicate_iri.clone()))
                .is_some_and(|id| stats.has_range_index(id));
            score /= if has_range_index { 100.0 } else { 10.0 };
        }
    }
    score
}

enum Position {
    Subject,
    Predicate,
    Object,
}

fn position_score(
    slot: &TermOrVariable,
    bound: &HashSet<Variable>,
    position: Position,
    stats: &Statistics,
    dict: &dyn Dictionary,
) -> f64 {
    match slot {
        TermOrVariable::Variable(v) => {
            if bound.contains(v) {
                1.0
            } else {
                match position {
                    Position::Subject => 100.0,
                    Position::Predicate => 50.0,
                    Position::Object => 100.0,
                }
            }
        }
        TermOrVariable::Term(term) => match (position, term) {
            (Position::Subject, _) => 1.0,
            (Position::Predicate, Term::NamedNode(iri)) => dict
                .resolve(&Term::NamedNode(iri.clone()))
                .and_then(|id| stats.predicate_triple_count(id))
                .map(histogram_score)
                .unwrap_or(10.0),
            (Position::Predicate, _) => 10.0,
            (Position::Object, Term::Literal(_)) => 2.0,
            (Position::Object, Term::BlankNode(_)) => 3.0,
            (Position::Object, Term::NamedNode(_)) => 5.0,
        },
    }
}

fn histogram_score(triple_count: u64) -> f64 {
    match triple_count {
        0..=9 => 0.5,
        10..=99 => 2.0,
        100..=999 => 10.0,
        1_000..=9_999 => 50.0,
        _ => 100.0,
    }
}

/// Variables that appear in a numeric-range comparison (`<`,`>`,`<=`,`>=`)
/// against a constant, joined by `AND`, or common to both sides of an
/// `OR`, anywhere in the tree's filters.
fn range_filtered_variables(tree: &Algebra) -> HashSet<Variable> {
    let mut vars = HashSet::new();
    collect_range_vars_recursive(tree, &mut vars);
    vars
}

fn collect_range_vars_recursive(tree: &Algebra, vars: &mut HashSet<Variable>) {
    if let Algebra::Filter(expr, _) = tree {
        collect_range_vars(expr, vars);
    }
    for child in ts_algebra::children(tree) {
        collect_range_vars_recursive(child, vars);
    }
}

fn collect_range_vars(expr: &Expr, vars: &mut HashSet<Variable>) {
    match expr {
        Expr::And(l, r) => {
            collect_range_vars(l, vars);
            collect_range_vars(r, vars);
        }
        Expr::Or(l, r) => {
            let mut left_vars = HashSet::new();
            let mut right_vars = HashSet::new();
            collect_range_vars(l, &mut left_vars);
            collect_range_vars(r, &mut right_vars);
            for v in left_vars.intersection(&right_vars) {
                vars.insert(v.clone());
            }
        }
        Expr::Less(l, r)
        | Expr::Greater(l, r)
        | Expr::LessOrEqual(l, r)
        | Expr::GreaterOrEqual(l, r) => {
            if let Some(v) = range_comparison_variable(l, r) {
                vars.insert(v);
            }
        }
        _ => {}
    }
}

fn range_comparison_variable(l: &Expr, r: &Expr) -> Option<Variable> {
    match (l, r) {
        (Expr::Variable(v), Expr::Term(_)) => Some(v.clone()),
        (Expr::Term(_), Expr::Variable(v)) => Some(v.clone()),
        _ => None,
    }
}
