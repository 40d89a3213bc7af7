use crate::{Algebra, AlgebraError, Expr};
use ts_model::{TermOrVariable, TriplePattern, Variable};

/// The distinct variables an algebra tree can bind, in first-occurrence
/// (pre-order, positional) order. Order is not semantically significant -
/// the contract only requires a unique set - but a stable order keeps
/// `explain` output and tests deterministic.
pub fn variables(node: &Algebra) -> Result<Vec<Variable>, AlgebraError> {
    let mut out = Vec::new();
    collect_variables(node, &mut out, 0)?;
    Ok(out)
}

fn push_unique(out: &mut Vec<Variable>, v: Variable) {
    if !out.contains(&v) {
        out.push(v);
    }
}

fn collect_variables(
    node: &Algebra,
    out: &mut Vec<Variable>,
    depth: usize,
) -> Result<(), AlgebraError> {
    if depth > ts_common::limits::MAX_DEPTH {
        return Err(AlgebraError::TooDeeplyNested);
    }
    match node {
        Algebra::Bgp(patterns) => {
            for pattern in patterns {
                for v in pattern.variables() {
                    push_unique(out, v.clone());
                }
            }
        }
        Algebra::Values(vars, _) => {
            for v in vars {
                push_unique(out, v.clone());
            }
        }
        Algebra::Join(l, r) | Algebra::Minus(l, r) | Algebra::Union(l, r) => {
            collect_variables(l, out, depth + 1)?;
            collect_variables(r, out, depth + 1)?;
        }
        Algebra::LeftJoin(l, r, filter) => {
            collect_variables(l, out, depth + 1)?;
            collect_variables(r, out, depth + 1)?;
            if let Some(expr) = filter {
                for v in expr.variables() {
                    push_unique(out, v.clone());
                }
            }
        }
        Algebra::Filter(expr, inner) => {
            collect_variables(inner, out, depth + 1)?;
            for v in expr.variables() {
                push_unique(out, v.clone());
            }
        }
        Algebra::Extend(inner, var, expr) => {
            collect_variables(inner, out, depth + 1)?;
            for v in expr.variables() {
                push_unique(out, v.clone());
            }
            push_unique(out, var.clone());
        }
        Algebra::Group(inner, by, aggs) => {
            collect_variables(inner, out, depth + 1)?;
            for v in by {
                push_unique(out, v.clone());
            }
            for (v, agg) in aggs {
                push_unique(out, v.clone());
                if let Some(expr) = agg.inner_expr() {
                    for v in expr.variables() {
                        push_unique(out, v.clone());
                    }
                }
            }
        }
        Algebra::Project(inner, vars) => {
            collect_variables(inner, out, depth + 1)?;
            for v in vars {
                push_unique(out, v.clone());
            }
        }
        Algebra::Distinct(inner) | Algebra::Reduced(inner) => {
            collect_variables(inner, out, depth + 1)?;
        }
        Algebra::OrderBy(inner, keys) => {
            collect_variables(inner, out, depth + 1)?;
            for (_, expr) in keys {
                for v in expr.variables() {
                    push_unique(out, v.clone());
                }
            }
        }
        Algebra::Slice(inner, _, _) => collect_variables(inner, out, depth + 1)?,
        Algebra::Service(endpoint, inner, _) | Algebra::Graph(endpoint, inner) => {
            if let TermOrVariable::Variable(v) = endpoint {
                push_unique(out, v.clone());
            }
            collect_variables(inner, out, depth + 1)?;
        }
        Algebra::Path(s, _, o) => {
            if let TermOrVariable::Variable(v) = s {
                push_unique(out, v.clone());
            }
            if let TermOrVariable::Variable(v) = o {
                push_unique(out, v.clone());
            }
        }
    }
    Ok(())
}

/// All `BGP` leaves reachable from `node`, in traversal order.
pub fn collect_bgps(node: &Algebra) -> Vec<&Vec<TriplePattern>> {
    let mut out = Vec::new();
    collect_bgps_into(node, &mut out);
    out
}

fn collect_bgps_into<'a>(node: &'a Algebra, out: &mut Vec<&'a Vec<TriplePattern>>) {
    if let Algebra::Bgp(patterns) = node {
        out.push(patterns);
    }
    for child in crate::traversal::children(node) {
        collect_bgps_into(child, out);
    }
}

/// All `Filter` expressions reachable from `node`, in traversal order.
pub fn collect_filters(node: &Algebra) -> Vec<&Expr> {
    let mut out = Vec::new();
    collect_filters_into(node, &mut out);
    out
}

fn collect_filters_into<'a>(node: &'a Algebra, out: &mut Vec<&'a Expr>) {
    if let Algebra::Filter(expr, _) = node {
        out.push(expr);
    }
    for child in crate::traversal::children(node) {
        collect_filters_into(child, out);
    }
}

/// Total number of triple patterns across every `BGP` leaf in the tree.
pub fn triple_count(node: &Algebra) -> usize {
    collect_bgps(node).iter().map(|p| p.len()).sum()
}

pub fn has_optional(node: &Algebra) -> bool {
    contains_variant(node, |n| matches!(n, Algebra::LeftJoin(..)))
}

pub fn has_union(node: &Algebra) -> bool {
    contains_variant(node, |n| matches!(n, Algebra::Union(..)))
}

pub fn has_filter(node: &Algebra) -> bool {
    contains_variant(node, |n| matches!(n, Algebra::Filter(..)))
}

pub fn has_aggregation(node: &Algebra) -> bool {
    contains_variant(node, |n| matches!(n, Algebra::Group(..)))
}

fn contains_variant(node: &Algebra, pred: impl Fn(&Algebra) -> bool + Copy) -> bool {
    if pred(node) {
        return true;
    }
    crate::traversal::children(node)
        .into_iter()
        .any(|c| contains_variant(c, pred))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_model::{Term, TermOrVariable};

    fn pattern(s: &str, p: &str, o: &str) -> TriplePattern {
        TriplePattern::new(
            TermOrVariable::Variable(Variable::new(s).unwrap()),
            TermOrVariable::Variable(Variable::new(p).unwrap()),
            TermOrVariable::Variable(Variable::new(o).unwrap()),
        )
    }

    #[test]
    fn variables_of_bgp_are_deduplicated() {
        let tree = Algebra::bgp(vec![pattern("s", "p", "o"), pattern("s", "p2", "o")]);
        let vars = variables(&tree).unwrap();
        assert_eq!(vars.len(), 4);
    }

    #[test]
    fn triple_count_sums_across_joined_bgps() {
        let tree = Algebra::join(
            Algebra::bgp(vec![pattern("a", "b", "c")]),
            Algebra::bgp(vec![pattern("d", "e", "f"), pattern("g", "h", "i")]),
        );
        assert_eq!(triple_count(&tree), 3);
    }

    #[test]
    fn has_union_detects_nested_union() {
        let tree = Algebra::distinct(Algebra::union(Algebra::empty_bgp(), Algebra::empty_bgp()));
        assert!(has_union(&tree));
        assert!(!has_optional(&tree));
    }

    #[test]
    fn collect_filters_finds_nested_filter_expression() {
        let filter_expr = Expr::Term(Term::Literal(oxrdf::Literal::new_simple_literal("lit")));
        let tree = Algebra::distinct(Algebra::filter(filter_expr, Algebra::empty_bgp()));
        assert_eq!(collect_filters(&tree).len(), 1);
    }
}
