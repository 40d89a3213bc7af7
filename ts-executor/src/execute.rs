use ts_algebra::Algebra;
use ts_model::{Binding, TermOrVariable};

use crate::bgp::execute_bgp;
use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::group;
use crate::operators;
use crate::stream::BindingStream;

/// Evaluates `node` against `ctx`, extending `binding` - the top-level
/// entry point `ts_engine` calls with `Binding::empty()`, and the same
/// function every sub-pattern recursion calls with whatever the enclosing
/// operator has already bound.
///
/// Exhaustive over every [`Algebra`] variant: `Path`, `Service` and any
/// non-default `Graph` are outside the executor's contract and return
/// [`ExecutionError::UnsupportedPattern`] / [`ExecutionError::NamedGraphsNotSupported`]
/// rather than attempting evaluation.
pub fn execute<'ctx>(
    node: &'ctx Algebra,
    ctx: &'ctx ExecutionContext<'ctx>,
    binding: Binding,
) -> Result<BindingStream<'ctx>, ExecutionError> {
    ctx.cancellation.check()?;
    match node {
        Algebra::Bgp(patterns) => execute_bgp(ctx, patterns, binding),
        Algebra::Join(left, right) => {
            let right_vars = ts_algebra::variables(right)?;
            let left_stream = execute(left, ctx, binding)?;
            let right = right.as_ref();
            Ok(operators::join(left_stream, right_vars, move |b| {
                execute(right, ctx, b).unwrap_or_else(|_| BindingStream::empty(Vec::new()))
            }))
        }
        Algebra::LeftJoin(left, right, filter) => {
            let right_vars = ts_algebra::variables(right)?;
            let left_stream = execute(left, ctx, binding)?;
            let right = right.as_ref();
            let filter = filter.clone();
            Ok(operators::left_join(
                left_stream,
                right_vars,
                move |b| execute(right, ctx, b).unwrap_or_else(|_| BindingStream::empty(Vec::new())),
                filter,
                ctx.base_iri,
            ))
        }
        Algebra::Minus(left, right) => {
            let left_stream = execute(left, ctx, binding.clone())?;
            let right_stream = execute(right, ctx, binding)?;
            Ok(operators::minus(left_stream, right_stream))
        }
        Algebra::Union(left, right) => {
            let left_stream = execute(left, ctx, binding.clone())?;
            let right_stream = execute(right, ctx, binding)?;
            Ok(operators::union(left_stream, right_stream))
        }
        Algebra::Filter(expr, inner) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(operators::filter(inner_stream, expr.clone(), ctx.base_iri))
        }
        Algebra::Extend(inner, var, expr) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(operators::extend(inner_stream, var.clone(), expr.clone(), ctx.base_iri))
        }
        Algebra::Group(inner, by, aggregates) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(group::group(inner_stream, by.clone(), aggregates.clone(), ctx.base_iri))
        }
        Algebra::Project(inner, vars) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(operators::project(inner_stream, vars.clone()))
        }
        Algebra::Distinct(inner) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(operators::distinct(inner_stream))
        }
        Algebra::Reduced(inner) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(operators::reduced(inner_stream))
        }
        Algebra::OrderBy(inner, keys) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(operators::order_by(inner_stream, keys.clone(), ctx.base_iri))
        }
        Algebra::Slice(inner, offset, limit) => {
            let inner_stream = execute(inner, ctx, binding)?;
            Ok(operators::slice(inner_stream, *offset, *limit))
        }
        Algebra::Values(vars, rows) => Ok(execute_values(vars, rows, binding)),
        Algebra::Service(..) => Err(ExecutionError::UnsupportedPattern(
            "SERVICE (federated query execution)".to_string(),
        )),
        Algebra::Graph(target, _) => Err(ExecutionError::NamedGraphsNotSupported(describe_graph(target))),
        Algebra::Path(..) => Err(ExecutionError::UnsupportedPattern(
            "property path evaluation".to_string(),
        )),
    }
}

fn describe_graph(target: &TermOrVariable) -> String {
    match target {
        TermOrVariable::Term(term) => format!("GRAPH {term}"),
        TermOrVariable::Variable(v) => format!("GRAPH {v}"),
    }
}

fn execute_values<'ctx>(
    vars: &[ts_model::Variable],
    rows: &[Vec<Option<ts_model::Term>>],
    seed: Binding,
) -> BindingStream<'ctx> {
    let bindings: Vec<Binding> = rows
        .iter()
        .filter_map(|row| {
            let mut binding = seed.clone();
            for (var, value) in vars.iter().zip(row.iter()) {
                if let Some(term) = value {
                    if binding.is_bound(var) {
                        if binding.get(var) != Some(term) {
                            return None;
                        }
                    } else {
                        binding.insert(var.clone(), term.clone());
                    }
                }
            }
            Some(binding)
        })
        .collect();
    BindingStream::new(vars.to_vec(), bindings.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;
    use ts_common::Statistics;
    use ts_dictionary::MemoryDictionary;
    use ts_model::{Term, Variable};
    use ts_storage::{MemoryTripleStore, TripleStore};

    fn iri(s: &str) -> Term {
        Term::NamedNode(NamedNode::new(s).unwrap())
    }

    #[test]
    fn service_is_unsupported() {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let node = Algebra::Service(
            TermOrVariable::Term(iri("http://ex/endpoint")),
            Box::new(Algebra::empty_bgp()),
            false,
        );
        let err = execute(&node, &ctx, Binding::empty()).unwrap_err();
        assert!(matches!(err, ExecutionError::UnsupportedPattern(_)));
    }

    #[test]
    fn named_graph_is_unsupported() {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let node = Algebra::Graph(
            TermOrVariable::Term(iri("http://ex/g1")),
            Box::new(Algebra::empty_bgp()),
        );
        let err = execute(&node, &ctx, Binding::empty()).unwrap_err();
        assert!(matches!(err, ExecutionError::NamedGraphsNotSupported(_)));
    }

    #[test]
    fn values_yields_one_binding_per_row() {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let x = Variable::new("x").unwrap();
        let node = Algebra::Values(
            vec![x.clone()],
            vec![vec![Some(iri("http://ex/a"))], vec![Some(iri("http://ex/b"))]],
        );
        let out: Vec<_> = execute(&node, &ctx, Binding::empty()).unwrap().collect();
        assert_eq!(out.len(), 2);
    }
}
