use crate::{Algebra, Expr};
use std::fmt;
use ts_model::TermOrVariable;

/// Renders an algebra tree as a single-line S-expression-ish form, e.g.
/// `Join(BGP([?s ?p ?o]), BGP([?s ?p2 ?o2]))`. This is not a SPARQL
/// serializer; it exists purely so optimizer/planner tests and `explain`
/// output can assert against a readable tree shape.
impl fmt::Display for Algebra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algebra::Bgp(patterns) => {
                write!(f, "BGP([")?;
                for (i, p) in patterns.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(
                        f,
                        "{} {} {}",
                        fmt_term_or_var(&p.subject),
                        fmt_term_or_var(&p.predicate),
                        fmt_term_or_var(&p.object)
                    )?;
                }
                write!(f, "])")
            }
            Algebra::Join(l, r) => write!(f, "Join({l}, {r})"),
            Algebra::LeftJoin(l, r, None) => write!(f, "LeftJoin({l}, {r})"),
            Algebra::LeftJoin(l, r, Some(filter)) => {
                write!(f, "LeftJoin({l}, {r}, {filter})")
            }
            Algebra::Minus(l, r) => write!(f, "Minus({l}, {r})"),
            Algebra::Union(l, r) => write!(f, "Union({l}, {r})"),
            Algebra::Filter(expr, inner) => write!(f, "Filter({expr}, {inner})"),
            Algebra::Extend(inner, var, expr) => write!(f, "Extend({inner}, {var}, {expr})"),
            Algebra::Group(inner, by, aggs) => {
                let by = by.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                let aggs = aggs
                    .iter()
                    .map(|(v, _)| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Group({inner}, [{by}], [{aggs}])")
            }
            Algebra::Project(inner, vars) => {
                let vars = vars.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "Project({inner}, [{vars}])")
            }
            Algebra::Distinct(inner) => write!(f, "Distinct({inner})"),
            Algebra::Reduced(inner) => write!(f, "Reduced({inner})"),
            Algebra::OrderBy(inner, keys) => {
                let keys = keys
                    .iter()
                    .map(|(dir, expr)| format!("{dir:?}({expr})"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "OrderBy({inner}, [{keys}])")
            }
            Algebra::Slice(inner, offset, limit) => {
                let limit = limit.map(|l| l.to_string()).unwrap_or_else(|| "∞".to_string());
                write!(f, "Slice({inner}, {offset}, {limit})")
            }
            Algebra::Values(vars, rows) => {
                let vars = vars.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "Values([{vars}], {} rows)", rows.len())
            }
            Algebra::Service(endpoint, inner, silent) => {
                write!(f, "Service({}, {inner}, silent={silent})", fmt_term_or_var(endpoint))
            }
            Algebra::Graph(term, inner) => write!(f, "Graph({}, {inner})", fmt_term_or_var(term)),
            Algebra::Path(s, _, o) => {
                write!(f, "Path({}, .., {})", fmt_term_or_var(s), fmt_term_or_var(o))
            }
        }
    }
}

fn fmt_term_or_var(tv: &TermOrVariable) -> String {
    match tv {
        TermOrVariable::Variable(v) => v.to_string(),
        TermOrVariable::Term(t) => t.to_string(),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(t) => write!(f, "{t}"),
            Expr::Variable(v) | Expr::Bound(v) => write!(f, "{v}"),
            Expr::Not(e) => write!(f, "!({e})"),
            Expr::And(l, r) => write!(f, "({l} && {r})"),
            Expr::Or(l, r) => write!(f, "({l} || {r})"),
            Expr::UnaryPlus(e) => write!(f, "(+{e})"),
            Expr::UnaryMinus(e) => write!(f, "(-{e})"),
            Expr::Add(l, r) => write!(f, "({l} + {r})"),
            Expr::Subtract(l, r) => write!(f, "({l} - {r})"),
            Expr::Multiply(l, r) => write!(f, "({l} * {r})"),
            Expr::Divide(l, r) => write!(f, "({l} / {r})"),
            Expr::Equal(l, r) => write!(f, "({l} = {r})"),
            Expr::Less(l, r) => write!(f, "({l} < {r})"),
            Expr::Greater(l, r) => write!(f, "({l} > {r})"),
            Expr::LessOrEqual(l, r) => write!(f, "({l} <= {r})"),
            Expr::GreaterOrEqual(l, r) => write!(f, "({l} >= {r})"),
            Expr::In(e, list) => {
                let list = list.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "({e} IN [{list}])")
            }
            Expr::If(c, t, e) => write!(f, "IF({c}, {t}, {e})"),
            Expr::Coalesce(list) => {
                let list = list.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "COALESCE({list})")
            }
            Expr::Call(func, args) => {
                let args = args.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "{func:?}({args})")
            }
            Expr::Exists(inner) => write!(f, "EXISTS({inner})"),
            Expr::NotExists(inner) => write!(f, "NOT EXISTS({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_model::{TriplePattern, Variable};

    #[test]
    fn bgp_prints_patterns() {
        let pattern = TriplePattern::new(
            TermOrVariable::Variable(Variable::new("s").unwrap()),
            TermOrVariable::Variable(Variable::new("p").unwrap()),
            TermOrVariable::Variable(Variable::new("o").unwrap()),
        );
        let tree = Algebra::bgp(vec![pattern]);
        assert_eq!(tree.to_string(), "BGP([?s ?p ?o])");
    }

    #[test]
    fn join_prints_both_children() {
        let tree = Algebra::join(Algebra::empty_bgp(), Algebra::empty_bgp());
        assert_eq!(tree.to_string(), "Join(BGP([]), BGP([]))");
    }
}
