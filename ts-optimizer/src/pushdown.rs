use crate::error::OptimizeError;
use std::collections::HashSet;
use ts_algebra::{Algebra, Expr};
use ts_common::limits::MAX_DEPTH;
use ts_model::Variable;

/// Pushes `FILTER` expressions as deep into the tree as the algebra
/// allows, per §4.3. A filter is split into its top-level `AND` conjuncts
/// first, since each conjunct may be pushable to a different depth.
pub fn push_down_filters(tree: &Algebra) -> Result<Algebra, OptimizeError> {
    push_at_depth(tree, 0)
}

fn push_at_depth(tree: &Algebra, depth: usize) -> Result<Algebra, OptimizeError> {
    if depth > MAX_DEPTH {
        return Err(OptimizeError::TooDeeplyNested);
    }
    let next = depth + 1;
    match tree {
        Algebra::Filter(expr, inner) => {
            let inner = push_at_depth(inner, next)?;
            let conjuncts = split_conjuncts(expr.clone());
            let mut remaining = Vec::new();
            let mut current = inner;
            for conjunct in conjuncts {
                let (rewritten, leftover) = try_push(conjunct, current, next)?;
                current = rewritten;
                if let Some(c) = leftover {
                    remaining.push(c);
                }
            }
            Ok(match conjoin(remaining) {
                Some(expr) => Algebra::Filter(expr, Box::new(current)),
                None => current,
            })
        }
        other => rebuild_with_pushed_children(other, next),
    }
}

/// Recurses into every non-`Filter` node's children so filters nested
/// further down still get a chance to push, without touching this node
/// itself.
fn rebuild_with_pushed_children(tree: &Algebra, depth: usize) -> Result<Algebra, OptimizeError> {
    Ok(match tree {
        Algebra::Bgp(_) | Algebra::Values(..) | Algebra::Path(..) => tree.clone(),
        Algebra::Join(l, r) => {
            Algebra::Join(Box::new(push_at_depth(l, depth)?), Box::new(push_at_depth(r, depth)?))
        }
        Algebra::LeftJoin(l, r, expr) => Algebra::LeftJoin(
            Box::new(push_at_depth(l, depth)?),
            Box::new(push_at_depth(r, depth)?),
            expr.clone(),
        ),
        Algebra::Minus(l, r) => {
            Algebra::Minus(Box::new(push_at_depth(l, depth)?), Box::new(push_at_depth(r, depth)?))
        }
        Algebra::Union(l, r) => {
            Algebra::Union(Box::new(push_at_depth(l, depth)?), Box::new(push_at_depth(r, depth)?))
        }
        Algebra::Filter(expr, inner) => {
            Algebra::Filter(expr.clone(), Box::new(push_at_depth(inner, depth)?))
        }
        Algebra::Extend(inner, var, expr) => {
            Algebra::Extend(Box::new(push_at_depth(inner, depth)?), var.clone(), expr.clone())
        }
        Algebra::Group(inner, keys, aggs) => {
            Algebra::Group(Box::new(push_at_depth(inner, depth)?), keys.clone(), aggs.clone())
        }
        Algebra::Project(inner, vars) => {
            Algebra::Project(Box::new(push_at_depth(inner, depth)?), vars.clone())
        }
        Algebra::Distinct(inner) => Algebra::Distinct(Box::new(push_at_depth(inner, depth)?)),
        Algebra::Reduced(inner) => Algebra::Reduced(Box::new(push_at_depth(inner, depth)?)),
        Algebra::OrderBy(inner, keys) => {
            Algebra::OrderBy(Box::new(push_at_depth(inner, depth)?), keys.clone())
        }
        Algebra::Slice(inner, offset, limit) => {
            Algebra::Slice(Box::new(push_at_depth(inner, depth)?), *offset, *limit)
        }
        Algebra::Service(target, inner, silent) => {
            Algebra::Service(target.clone(), Box::new(push_at_depth(inner, depth)?), *silent)
        }
        Algebra::Graph(target, inner) => {
            Algebra::Graph(target.clone(), Box::new(push_at_depth(inner, depth)?))
        }
    })
}

/// Attempts to push `conjunct` one level into `node`. Returns the
/// (possibly rewritten) node and, if the conjunct could not be pushed any
/// further, the conjunct itself so the caller can re-wrap it in a `Filter`.
fn try_push(
    conjunct: Expr,
    node: Algebra,
    depth: usize,
) -> Result<(Algebra, Option<Expr>), OptimizeError> {
    if depth > MAX_DEPTH {
        return Err(OptimizeError::TooDeeplyNested);
    }
    let conjunct_vars: HashSet<Variable> = conjunct.variables().into_iter().cloned().collect();

    match node {
        Algebra::Join(l, r) => {
            let vars_l = variable_set(&l)?;
            if conjunct_vars.is_subset(&vars_l) {
                let (new_l, leftover) = try_push(conjunct, *l, depth + 1)?;
                return Ok((Algebra::Join(Box::new(new_l), r), leftover));
            }
            let vars_r = variable_set(&r)?;
            if conjunct_vars.is_subset(&vars_r) {
                let (new_r, leftover) = try_push(conjunct, *r, depth + 1)?;
                return Ok((Algebra::Join(l, Box::new(new_r)), leftover));
            }
            Ok((Algebra::Join(l, r), Some(conjunct)))
        }
        Algebra::LeftJoin(l, r, opt_expr) => {
            let vars_l = variable_set(&l)?;
            if conjunct_vars.is_subset(&vars_l) {
                let (new_l, leftover) = try_push(conjunct, *l, depth + 1)?;
                Ok((Algebra::LeftJoin(Box::new(new_l), r, opt_expr), leftover))
            } else {
                // Never pushed into the optional side, and never left to
                // reference only R's variables past this point.
                Ok((Algebra::LeftJoin(l, r, opt_expr), Some(conjunct)))
            }
        }
        Algebra::Union(..) | Algebra::Minus(..) | Algebra::Group(..) => {
            Ok((node, Some(conjunct)))
        }
        Algebra::Extend(inner, var, expr) => {
            if conjunct_vars.contains(&var) {
                Ok((Algebra::Extend(inner, var, expr), Some(conjunct)))
            } else {
                let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
                Ok((Algebra::Extend(Box::new(new_inner), var, expr), leftover))
            }
        }
        Algebra::Project(inner, vars) => {
            let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
            Ok((Algebra::Project(Box::new(new_inner), vars), leftover))
        }
        Algebra::Distinct(inner) => {
            let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
            Ok((Algebra::Distinct(Box::new(new_inner)), leftover))
        }
        Algebra::Reduced(inner) => {
            let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
            Ok((Algebra::Reduced(Box::new(new_inner)), leftover))
        }
        Algebra::OrderBy(inner, keys) => {
            let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
            Ok((Algebra::OrderBy(Box::new(new_inner), keys), leftover))
        }
        Algebra::Slice(inner, offset, limit) => {
            let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
            Ok((Algebra::Slice(Box::new(new_inner), offset, limit), leftover))
        }
        Algebra::Graph(target, inner) => {
            let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
            Ok((Algebra::Graph(target, Box::new(new_inner)), leftover))
        }
        Algebra::Filter(inner_expr, inner) => {
            let (new_inner, leftover) = try_push(conjunct, *inner, depth + 1)?;
            match leftover {
                None => Ok((Algebra::Filter(inner_expr, Box::new(new_inner)), None)),
                Some(unpushed) => Ok((
                    Algebra::Filter(Expr::And(Box::new(inner_expr), Box::new(unpushed)), Box::new(new_inner)),
                    None,
                )),
            }
        }
        Algebra::Bgp(patterns) => {
            let bgp_vars: HashSet<Variable> = patterns
                .iter()
                .flat_map(|p| p.variables().into_iter().cloned())
                .collect();
            if conjunct_vars.is_subset(&bgp_vars) {
                Ok((Algebra::Filter(conjunct, Box::new(Algebra::Bgp(patterns))), None))
            } else {
                Ok((Algebra::Bgp(patterns), Some(conjunct)))
            }
        }
        Algebra::Values(..) | Algebra::Path(..) | Algebra::Service(..) => {
            Ok((node, Some(conjunct)))
        }
    }
}

fn variable_set(tree: &Algebra) -> Result<HashSet<Variable>, OptimizeError> {
    Ok(ts_algebra::variables(tree)?.into_iter().collect())
}

fn split_conjuncts(expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::And(l, r) => {
            let mut out = split_conjuncts(*l);
            out.extend(split_conjuncts(*r));
            out
        }
        other => vec![other],
    }
}

fn conjoin(mut exprs: Vec<Expr>) -> Option<Expr> {
    let mut result = exprs.pop()?;
    while let Some(next) = exprs.pop() {
        result = Expr::And(Box::new(next), Box::new(result));
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;
    use ts_model::{Term, TermOrVariable, TriplePattern};

    fn var(name: &str) -> Variable {
        Variable::new(name).unwrap()
    }

    fn var_expr(name: &str) -> Expr {
        Expr::Variable(var(name))
    }

    fn const_expr() -> Expr {
        Expr::Term(Term::NamedNode(NamedNode::new("http://ex/c").unwrap()))
    }

    fn pattern(s: &str, p: &str, o: &str) -> TriplePattern {
        TriplePattern::new(
            TermOrVariable::Variable(var(s)),
            TermOrVariable::Variable(var(p)),
            TermOrVariable::Variable(var(o)),
        )
    }

    #[test]
    fn filter_pushes_into_covering_join_side() {
        let tree = Algebra::Filter(
            Expr::Equal(Box::new(var_expr("a")), Box::new(const_expr())),
            Box::new(Algebra::join(
                Algebra::bgp(vec![pattern("a", "p1", "x")]),
                Algebra::bgp(vec![pattern("b", "p2", "y")]),
            )),
        );
        let pushed = push_down_filters(&tree).unwrap();
        match pushed {
            Algebra::Join(l, r) => {
                assert!(matches!(*l, Algebra::Filter(..)));
                assert!(matches!(*r, Algebra::Bgp(_)));
            }
            other => panic!("expected a join, got {other:?}"),
        }
    }

    #[test]
    fn filter_on_optional_side_stays_above_left_join() {
        let tree = Algebra::Filter(
            Expr::Equal(Box::new(var_expr("b")), Box::new(const_expr())),
            Box::new(Algebra::left_join(
                Algebra::bgp(vec![pattern("a", "p1", "x")]),
                Algebra::bgp(vec![pattern("b", "p2", "y")]),
                None,
            )),
        );
        let pushed = push_down_filters(&tree).unwrap();
        assert!(matches!(pushed, Algebra::Filter(_, _)));
    }

    #[test]
    fn filter_does_not_push_across_union() {
        let tree = Algebra::Filter(
            Expr::Equal(Box::new(var_expr("a")), Box::new(const_expr())),
            Box::new(Algebra::union(
                Algebra::bgp(vec![pattern("a", "p1", "x")]),
                Algebra::bgp(vec![pattern("a", "p2", "y")]),
            )),
        );
        let pushed = push_down_filters(&tree).unwrap();
        assert!(matches!(pushed, Algebra::Filter(_, _)));
    }

    #[test]
    fn filter_pushes_through_project_unchanged() {
        let tree = Algebra::Filter(
            Expr::Equal(Box::new(var_expr("a")), Box::new(const_expr())),
            Box::new(Algebra::project(
                Algebra::bgp(vec![pattern("a", "p1", "x")]),
                vec![var("a")],
            )),
        );
        let pushed = push_down_filters(&tree).unwrap();
        match pushed {
            Algebra::Project(inner, _) => assert!(matches!(*inner, Algebra::Filter(..))),
            other => panic!("expected a project, got {other:?}"),
        }
    }
}
