use std::collections::HashSet;

use ts_algebra::{CompiledQuery, QueryType};
use ts_common::limits::MAX_DEPTH;
use ts_model::{Binding, BlankNode, Term, TermOrVariable, Triple, Variable};

use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::execute::execute;
use crate::stream::{drain, drain_at_most};

/// The serialized result of one compiled query, named directly after this
/// engine's four SPARQL query forms.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
    Select { variables: Vec<Variable>, rows: Vec<Binding> },
    Ask(bool),
    Construct(Vec<Triple>),
    Describe(Vec<Triple>),
}

pub fn execute_query<'ctx>(
    compiled: &'ctx CompiledQuery,
    ctx: &'ctx ExecutionContext<'ctx>,
) -> Result<QueryResults, ExecutionError> {
    match compiled.query_type {
        QueryType::Select => execute_select(compiled, ctx),
        QueryType::Ask => execute_ask(compiled, ctx),
        QueryType::Construct => execute_construct(compiled, ctx),
        QueryType::Describe => execute_describe(compiled, ctx),
    }
}

fn execute_select<'ctx>(
    compiled: &'ctx CompiledQuery,
    ctx: &'ctx ExecutionContext<'ctx>,
) -> Result<QueryResults, ExecutionError> {
    let stream = execute(&compiled.pattern, ctx, Binding::empty())?;
    let variables = stream.variables().to_vec();
    let rows = drain(stream, &ctx.cancellation)?;
    Ok(QueryResults::Select { variables, rows })
}

/// `true` iff the pattern produces at least one solution; only the first
/// solution is ever pulled, so a BGP that would otherwise scan millions of
/// triples stops at the first match.
fn execute_ask<'ctx>(
    compiled: &'ctx CompiledQuery,
    ctx: &'ctx ExecutionContext<'ctx>,
) -> Result<QueryResults, ExecutionError> {
    let stream = execute(&compiled.pattern, ctx, Binding::empty())?;
    let rows = drain_at_most(stream, 1, &ctx.cancellation)?;
    Ok(QueryResults::Ask(!rows.is_empty()))
}

/// Instantiates `compiled.template` against every solution: blank nodes in
/// the template get a fresh id per solution (cleared once that solution is
/// done), a template triple with any unresolved position is skipped, and a
/// ground triple is deduplicated - except one carrying a blank node, which
/// is always re-emitted, since a freshly allocated blank node can never
/// equal a previously emitted one anyway.
fn execute_construct<'ctx>(
    compiled: &'ctx CompiledQuery,
    ctx: &'ctx ExecutionContext<'ctx>,
) -> Result<QueryResults, ExecutionError> {
    let stream = execute(&compiled.pattern, ctx, Binding::empty())?;
    let rows = drain(stream, &ctx.cancellation)?;

    let mut seen: HashSet<Triple> = HashSet::new();
    let mut out = Vec::new();
    for row in &rows {
        ctx.cancellation.check()?;
        let mut bnodes: std::collections::HashMap<BlankNode, BlankNode> = Default::default();
        for (s, p, o) in &compiled.template {
            let subject = resolve_template_term(s, row, &mut bnodes);
            let predicate = resolve_template_term(p, row, &mut bnodes);
            let object = resolve_template_term(o, row, &mut bnodes);
            let (Some(subject), Some(predicate), Some(object)) = (subject, predicate, object) else {
                continue;
            };
            let Some(subject) = term_to_subject(subject) else {
                continue;
            };
            let Term::NamedNode(predicate) = predicate else {
                continue;
            };
            let triple = Triple { subject, predicate, object };
            let is_new = matches!(triple.subject, ts_model::Subject::BlankNode(_))
                || matches!(triple.object, Term::BlankNode(_))
                || seen.insert(triple.clone());
            if is_new {
                out.push(triple);
            }
        }
    }
    Ok(QueryResults::Construct(out))
}

fn resolve_template_term(
    slot: &TermOrVariable,
    binding: &Binding,
    bnodes: &mut std::collections::HashMap<BlankNode, BlankNode>,
) -> Option<Term> {
    match slot {
        TermOrVariable::Term(Term::BlankNode(b)) => {
            let fresh = bnodes.entry(b.clone()).or_insert_with(BlankNode::default);
            Some(Term::BlankNode(fresh.clone()))
        }
        TermOrVariable::Term(t) => Some(t.clone()),
        TermOrVariable::Variable(v) => binding.get(v).cloned(),
    }
}

fn term_to_subject(term: Term) -> Option<ts_model::Subject> {
    match term {
        Term::NamedNode(n) => Some(ts_model::Subject::NamedNode(n)),
        Term::BlankNode(n) => Some(ts_model::Subject::BlankNode(n)),
        Term::Literal(_) => None,
    }
}

/// `DESCRIBE`: `compiled.dataset` carries the DESCRIBE target list - a mix
/// of explicit IRIs and projected variables, exactly what `DESCRIBE <a>
/// ?b` names. Each target is resolved per solution (a variable target with
/// no WHERE clause still yields one empty solution, same as any other
/// pattern-less query); every resolved resource's Concise Bounded
/// Description is unioned into the result, deduplicated, and blank-node
/// objects are followed transitively so the description stays connected.
fn execute_describe<'ctx>(
    compiled: &'ctx CompiledQuery,
    ctx: &'ctx ExecutionContext<'ctx>,
) -> Result<QueryResults, ExecutionError> {
    let stream = execute(&compiled.pattern, ctx, Binding::empty())?;
    let rows = drain(stream, &ctx.cancellation)?;

    let mut roots: Vec<Term> = Vec::new();
    for row in &rows {
        for target in &compiled.dataset {
            let resolved = match target {
                TermOrVariable::Term(t) => Some(t.clone()),
                TermOrVariable::Variable(v) => row.get(v).cloned(),
            };
            if let Some(term) = resolved {
                if !roots.contains(&term) {
                    roots.push(term);
                }
            }
        }
    }

    let mut visited: HashSet<Term> = HashSet::new();
    let mut out: Vec<Triple> = Vec::new();
    for root in roots {
        collect_cbd(ctx, &root, &mut visited, &mut out, 0)?;
    }
    Ok(QueryResults::Describe(out))
}

/// Depth-capped at [`MAX_DEPTH`] so a pathological blank-node cycle cannot
/// recurse unboundedly; `visited` additionally guards against revisiting
/// the same resource within one description.
fn collect_cbd<'ctx>(
    ctx: &'ctx ExecutionContext<'ctx>,
    subject: &Term,
    visited: &mut HashSet<Term>,
    out: &mut Vec<Triple>,
    depth: usize,
) -> Result<(), ExecutionError> {
    ctx.cancellation.check()?;
    if depth >= MAX_DEPTH || !visited.insert(subject.clone()) {
        return Ok(());
    }
    let Some(subject_id) = ctx.dictionary.resolve(subject) else {
        return Ok(());
    };
    let pattern = ts_storage::BoundPattern::new(Some(subject_id), None, None);
    let matches: Vec<_> = ctx.snapshot.scan(pattern).collect();
    for id_triple in matches {
        let (Some(predicate), Some(object)) = (
            ctx.dictionary.decode(id_triple.predicate),
            ctx.dictionary.decode(id_triple.object),
        ) else {
            continue;
        };
        let Term::NamedNode(predicate_node) = predicate else {
            continue;
        };
        let Some(subject_node) = term_to_subject(subject.clone()) else {
            continue;
        };
        out.push(Triple {
            subject: subject_node,
            predicate: predicate_node,
            object: object.clone(),
        });
        if let Term::BlankNode(_) = &object {
            collect_cbd(ctx, &object, visited, out, depth + 1)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;
    use ts_algebra::Algebra;
    use ts_common::Statistics;
    use ts_dictionary::MemoryDictionary;
    use ts_model::{IdTriple, TriplePattern};
    use ts_storage::{MemoryTripleStore, TripleStore};

    fn iri(s: &str) -> Term {
        Term::NamedNode(NamedNode::new(s).unwrap())
    }

    fn iri_slot(s: &str) -> TermOrVariable {
        TermOrVariable::Term(iri(s))
    }

    fn var(name: &str) -> Variable {
        Variable::new(name).unwrap()
    }

    fn var_slot(name: &str) -> TermOrVariable {
        TermOrVariable::Variable(var(name))
    }

    fn fixture() -> (MemoryDictionary, MemoryTripleStore) {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let alice = dict.resolve_or_create(&iri("http://ex/alice"));
        let knows = dict.resolve_or_create(&iri("http://ex/knows"));
        let bob = dict.resolve_or_create(&iri("http://ex/bob"));
        store.insert_batch(&[IdTriple::new(alice, knows, bob)]).unwrap();
        (dict, store)
    }

    #[test]
    fn ask_is_true_when_pattern_matches() {
        let (dict, store) = fixture();
        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let pattern = Algebra::bgp(vec![TriplePattern::new(var_slot("s"), var_slot("p"), var_slot("o"))]);
        let compiled = CompiledQuery {
            query_type: QueryType::Ask,
            pattern,
            dataset: Vec::new(),
            base_iri: None,
            template: Vec::new(),
        };
        let result = execute_query(&compiled, &ctx).unwrap();
        assert_eq!(result, QueryResults::Ask(true));
    }

    #[test]
    fn construct_instantiates_template_per_solution() {
        let (dict, store) = fixture();
        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let pattern = Algebra::bgp(vec![TriplePattern::new(var_slot("s"), iri_slot("http://ex/knows"), var_slot("o"))]);
        let compiled = CompiledQuery {
            query_type: QueryType::Construct,
            pattern,
            dataset: Vec::new(),
            base_iri: None,
            template: vec![(var_slot("s"), iri_slot("http://ex/knows"), var_slot("o"))],
        };
        let result = execute_query(&compiled, &ctx).unwrap();
        match result {
            QueryResults::Construct(triples) => assert_eq!(triples.len(), 1),
            other => panic!("expected Construct, got {other:?}"),
        }
    }

    #[test]
    fn describe_returns_the_subjects_bounded_description() {
        let (dict, store) = fixture();
        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let compiled = CompiledQuery {
            query_type: QueryType::Describe,
            pattern: Algebra::empty_bgp(),
            dataset: vec![iri_slot("http://ex/alice")],
            base_iri: None,
            template: Vec::new(),
        };
        let result = execute_query(&compiled, &ctx).unwrap();
        match result {
            QueryResults::Describe(triples) => {
                assert_eq!(triples.len(), 1);
                assert_eq!(triples[0].predicate, NamedNode::new("http://ex/knows").unwrap());
            }
            other => panic!("expected Describe, got {other:?}"),
        }
    }
}
