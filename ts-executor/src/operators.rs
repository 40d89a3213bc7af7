use std::cmp::Ordering;

use ts_algebra::{Expr, OrderDirection};
use ts_model::{Binding, Variable};

use crate::stream::BindingStream;

/// Inner join: every pair of compatible bindings, merged. The right side
/// is re-evaluated once per left solution so that any variable the left
/// side already bound is substituted into the right side as a constant -
/// the same nested-loop semantics `ts_executor::bgp` uses for a plan's
/// `Join` node, just over two arbitrary sub-streams instead of two scans.
pub fn join<'ctx>(
    left: BindingStream<'ctx>,
    right_vars: Vec<Variable>,
    right: impl Fn(Binding) -> BindingStream<'ctx> + 'ctx,
) -> BindingStream<'ctx> {
    let variables = merged_variables(left.variables(), &right_vars);
    let inner = left.flat_map(move |l| right(l).collect::<Vec<_>>().into_iter());
    BindingStream::new(variables, inner)
}

/// `OPTIONAL`: every left solution is kept even if the right side (after
/// `filter`, if present) produces nothing for it.
pub fn left_join<'ctx>(
    left: BindingStream<'ctx>,
    right_vars: Vec<Variable>,
    right: impl Fn(Binding) -> BindingStream<'ctx> + 'ctx,
    filter: Option<Expr>,
    base_iri: Option<&'ctx str>,
) -> BindingStream<'ctx> {
    let variables = merged_variables(left.variables(), &right_vars);
    let inner = left.flat_map(move |l| {
        let matches: Vec<Binding> = right(l.clone())
            .filter(|candidate| match &filter {
                None => true,
                Some(expr) => ts_functions::evaluate(expr, candidate, base_iri)
                    .map(|t| ts_functions::effective_boolean_value(&t).unwrap_or(false))
                    .unwrap_or(false),
            })
            .collect();
        if matches.is_empty() {
            vec![l]
        } else {
            matches
        }
        .into_iter()
    });
    BindingStream::new(variables, inner)
}

/// `MINUS`: drops every left solution that shares at least one variable
/// with, and is compatible with, some right solution. The right side is
/// materialized once up front and probed per left row.
pub fn minus<'ctx>(left: BindingStream<'ctx>, right: BindingStream<'ctx>) -> BindingStream<'ctx> {
    let variables = left.variables().to_vec();
    let rights: Vec<Binding> = right.collect();
    let inner = left.filter(move |l| {
        !rights.iter().any(|r| shares_a_variable(l, r) && l.is_compatible(r))
    });
    BindingStream::new(variables, inner)
}

fn shares_a_variable(a: &Binding, b: &Binding) -> bool {
    a.variables().any(|v| b.is_bound(v))
}

pub fn union<'ctx>(left: BindingStream<'ctx>, right: BindingStream<'ctx>) -> BindingStream<'ctx> {
    let variables = merged_variables(left.variables(), right.variables());
    let inner = left.chain(right);
    BindingStream::new(variables, inner)
}

pub fn filter<'ctx>(
    input: BindingStream<'ctx>,
    expr: Expr,
    base_iri: Option<&'ctx str>,
) -> BindingStream<'ctx> {
    let variables = input.variables().to_vec();
    let inner = input.filter(move |binding| {
        ts_functions::evaluate(&expr, binding, base_iri)
            .and_then(|t| ts_functions::effective_boolean_value(&t))
            .unwrap_or(false)
    });
    BindingStream::new(variables, inner)
}

/// `BIND`: a failed expression leaves the binding unchanged rather than
/// rejecting it, per the per-binding error handling rules.
pub fn extend<'ctx>(
    input: BindingStream<'ctx>,
    var: Variable,
    expr: Expr,
    base_iri: Option<&'ctx str>,
) -> BindingStream<'ctx> {
    let mut variables = input.variables().to_vec();
    if !variables.contains(&var) {
        variables.push(var.clone());
    }
    let inner = input.map(move |mut binding| {
        if let Ok(value) = ts_functions::evaluate(&expr, &binding, base_iri) {
            binding.insert(var.clone(), value);
        }
        binding
    });
    BindingStream::new(variables, inner)
}

pub fn project<'ctx>(input: BindingStream<'ctx>, vars: Vec<Variable>) -> BindingStream<'ctx> {
    let output_vars = vars.clone();
    let inner = input.map(move |binding| binding.project(&vars));
    BindingStream::new(output_vars, inner)
}

pub fn distinct<'ctx>(input: BindingStream<'ctx>) -> BindingStream<'ctx> {
    let variables = input.variables().to_vec();
    let mut seen = std::collections::HashSet::new();
    let inner = input.filter(move |binding| seen.insert(binding_key(binding)));
    BindingStream::new(variables, inner)
}

/// `REDUCED` permits but does not require duplicate elimination; this
/// executor implements it as DISTINCT, which is always a valid reduction.
pub fn reduced<'ctx>(input: BindingStream<'ctx>) -> BindingStream<'ctx> {
    distinct(input)
}

fn binding_key(binding: &Binding) -> Vec<(Variable, String)> {
    let mut entries: Vec<(Variable, String)> = binding
        .iter()
        .map(|(v, t)| (v.clone(), format!("{t:?}")))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

pub fn order_by<'ctx>(
    input: BindingStream<'ctx>,
    keys: Vec<(OrderDirection, Expr)>,
    base_iri: Option<&'ctx str>,
) -> BindingStream<'ctx> {
    let variables = input.variables().to_vec();
    let mut rows: Vec<Binding> = input.collect();
    rows.sort_by(|a, b| {
        for (direction, expr) in &keys {
            let va = ts_functions::evaluate(expr, a, base_iri);
            let vb = ts_functions::evaluate(expr, b, base_iri);
            // Error terms sort last, regardless of direction.
            let ord = match (va, vb) {
                (Ok(va), Ok(vb)) => ts_functions::canonical_order(&va, &vb),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => Ordering::Equal,
            };
            let ord = match direction {
                OrderDirection::Asc => ord,
                OrderDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    BindingStream::new(variables, rows.into_iter())
}

pub fn slice<'ctx>(input: BindingStream<'ctx>, offset: i64, limit: Option<u64>) -> BindingStream<'ctx> {
    let variables = input.variables().to_vec();
    let skip = offset.max(0) as usize;
    let inner: Box<dyn Iterator<Item = Binding> + 'ctx> = match limit {
        Some(limit) => Box::new(input.skip(skip).take(limit as usize)),
        None => Box::new(input.skip(skip)),
    };
    BindingStream::new(variables, inner)
}

fn merged_variables(a: &[Variable], b: &[Variable]) -> Vec<Variable> {
    let mut out = a.to_vec();
    for v in b {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{vocab::xsd, Literal};
    use ts_model::Term;

    fn var(name: &str) -> Variable {
        Variable::new(name).unwrap()
    }

    fn int(v: i64) -> Term {
        Term::Literal(Literal::new_typed_literal(v.to_string(), xsd::INTEGER))
    }

    fn stream(rows: Vec<Binding>, vars: Vec<Variable>) -> BindingStream<'static> {
        BindingStream::new(vars, rows.into_iter())
    }

    #[test]
    fn distinct_drops_duplicate_rows() {
        let rows = vec![
            Binding::empty().with(var("x"), int(1)),
            Binding::empty().with(var("x"), int(1)),
            Binding::empty().with(var("x"), int(2)),
        ];
        let out: Vec<_> = distinct(stream(rows, vec![var("x")])).collect();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn slice_applies_offset_and_limit() {
        let rows = (0..10)
            .map(|i| Binding::empty().with(var("x"), int(i)))
            .collect();
        let out: Vec<_> = slice(stream(rows, vec![var("x")]), 2, Some(3)).collect();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].get(&var("x")), Some(&int(2)));
    }

    #[test]
    fn order_by_sorts_ascending_by_default() {
        let rows = vec![
            Binding::empty().with(var("x"), int(3)),
            Binding::empty().with(var("x"), int(1)),
            Binding::empty().with(var("x"), int(2)),
        ];
        let keys = vec![(OrderDirection::Asc, Expr::Variable(var("x")))];
        let out: Vec<_> = order_by(stream(rows, vec![var("x")]), keys, None).collect();
        assert_eq!(out[0].get(&var("x")), Some(&int(1)));
        assert_eq!(out[2].get(&var("x")), Some(&int(3)));
    }

    #[test]
    fn extend_keeps_binding_unchanged_on_evaluation_error() {
        let rows = vec![Binding::empty().with(var("x"), int(1))];
        let expr = Expr::Variable(var("missing"));
        let out: Vec<_> = extend(stream(rows, vec![var("x")]), var("y"), expr, None).collect();
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_bound(&var("y")));
    }
}
