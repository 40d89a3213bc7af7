use ts_algebra::Algebra;
use ts_common::limits::{CLEAR_CHUNK_SIZE, MAX_DATA_TRIPLES, MAX_PATTERN_MATCHES, MAX_TEMPLATE_TRIPLES};
use ts_dictionary::Dictionary;
use ts_model::{Binding, IdTriple, Term, TermOrVariable, TriplePattern};
use ts_storage::{BoundPattern, Snapshot, TripleStore};

use crate::cancellation::Cancellation;
use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::execute::execute;
use crate::stream::drain_capped;

pub type GroundTriple = (Term, Term, Term);
pub type TemplateTriple = (TermOrVariable, TermOrVariable, TermOrVariable);

/// One SPARQL Update operation, already parsed into algebra-level shapes.
/// Like [`ts_algebra::compile::ParsedQuery`] for queries, this is the
/// boundary between an external update-text parser and this sub-executor.
#[derive(Clone, Debug)]
pub enum UpdateOperation {
    InsertData(Vec<GroundTriple>),
    DeleteData(Vec<GroundTriple>),
    DeleteInsertWhere {
        delete_template: Vec<TemplateTriple>,
        insert_template: Vec<TemplateTriple>,
        pattern: Algebra,
    },
    DeleteWhere(Vec<TriplePattern>),
    Clear { target: ClearTarget, silent: bool },
    Create { silent: bool },
    Drop { silent: bool },
    Load { source: String },
}

/// What a `CLEAR` (or, degenerately, a `DROP`) targets. Since this store
/// has no named-graph concept, `Default`/`All` both mean "the one graph
/// this store has", and `Named` (the set of all named graphs) is always
/// already empty.
#[derive(Clone, Debug)]
pub enum ClearTarget {
    Default,
    Named,
    All,
    Graph(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub triples_inserted: u64,
    pub triples_deleted: u64,
}

/// Runs one update operation against `store`/`dict`. Each operation is a
/// single atomic unit (its own `insert_batch`/`delete_batch` call); a
/// sequence of several operations (as `ts_engine::Store::update` accepts)
/// is run one at a time with no cross-operation rollback, matching the
/// SPARQL Update atomicity boundary.
pub fn execute_update<S: TripleStore>(
    store: &S,
    dict: &dyn Dictionary,
    op: &UpdateOperation,
    cancellation: &Cancellation,
) -> Result<UpdateResult, ExecutionError> {
    cancellation.check()?;
    match op {
        UpdateOperation::InsertData(triples) => insert_data(store, dict, triples),
        UpdateOperation::DeleteData(triples) => delete_data(store, dict, triples),
        UpdateOperation::DeleteInsertWhere {
            delete_template,
            insert_template,
            pattern,
        } => delete_insert_where(store, dict, delete_template, insert_template, pattern, cancellation),
        UpdateOperation::DeleteWhere(patterns) => delete_where(store, dict, patterns, cancellation),
        UpdateOperation::Clear { target, silent } => clear(store, target, *silent, cancellation),
        UpdateOperation::Create { .. } => Ok(UpdateResult::default()),
        UpdateOperation::Drop { silent } => drop_graph(store, *silent, cancellation),
        UpdateOperation::Load { .. } => Err(ExecutionError::LoadNotImplemented),
    }
}

fn insert_data<S: TripleStore>(
    store: &S,
    dict: &dyn Dictionary,
    triples: &[GroundTriple],
) -> Result<UpdateResult, ExecutionError> {
    if triples.len() > MAX_DATA_TRIPLES {
        return Err(ExecutionError::TooManyTriples {
            what: "INSERT DATA",
            limit: MAX_DATA_TRIPLES,
        });
    }
    let batch: Vec<IdTriple> = triples
        .iter()
        .map(|(s, p, o)| {
            IdTriple::new(
                dict.resolve_or_create(s),
                dict.resolve_or_create(p),
                dict.resolve_or_create(o),
            )
        })
        .collect();
    store.insert_batch(&batch)?;
    Ok(UpdateResult {
        triples_inserted: batch.len() as u64,
        triples_deleted: 0,
    })
}

fn delete_data<S: TripleStore>(
    store: &S,
    dict: &dyn Dictionary,
    triples: &[GroundTriple],
) -> Result<UpdateResult, ExecutionError> {
    if triples.len() > MAX_DATA_TRIPLES {
        return Err(ExecutionError::TooManyTriples {
            what: "DELETE DATA",
            limit: MAX_DATA_TRIPLES,
        });
    }
    // A term DELETE DATA names that the dictionary has never seen cannot
    // possibly be stored; such a triple is silently skipped rather than
    // treated as an error.
    let batch: Vec<IdTriple> = triples
        .iter()
        .filter_map(|(s, p, o)| {
            Some(IdTriple::new(dict.resolve(s)?, dict.resolve(p)?, dict.resolve(o)?))
        })
        .collect();
    let deleted = batch.len() as u64;
    store.delete_batch(&batch)?;
    Ok(UpdateResult {
        triples_inserted: 0,
        triples_deleted: deleted,
    })
}

fn delete_insert_where<S: TripleStore>(
    store: &S,
    dict: &dyn Dictionary,
    delete_template: &[TemplateTriple],
    insert_template: &[TemplateTriple],
    pattern: &Algebra,
    cancellation: &Cancellation,
) -> Result<UpdateResult, ExecutionError> {
    if delete_template.len() > MAX_TEMPLATE_TRIPLES || insert_template.len() > MAX_TEMPLATE_TRIPLES {
        return Err(ExecutionError::TemplateTooLarge(MAX_TEMPLATE_TRIPLES));
    }

    let snapshot = store.snapshot();
    let stats = store.statistics();
    let ctx = ExecutionContext::new(&snapshot, dict, &stats).with_cancellation(cancellation.clone());
    let matches = drain_capped(
        execute(pattern, &ctx, Binding::empty())?,
        MAX_PATTERN_MATCHES,
        cancellation,
    )?;

    let deletes = instantiate_ground(delete_template, &matches, dict, |d, t| d.resolve(t));
    let inserts = instantiate_ground(insert_template, &matches, dict, |d, t| Some(d.resolve_or_create(t)));

    store.delete_batch(&deletes)?;
    store.insert_batch(&inserts)?;
    Ok(UpdateResult {
        triples_inserted: inserts.len() as u64,
        triples_deleted: deletes.len() as u64,
    })
}

fn delete_where<S: TripleStore>(
    store: &S,
    dict: &dyn Dictionary,
    patterns: &[TriplePattern],
    cancellation: &Cancellation,
) -> Result<UpdateResult, ExecutionError> {
    let template: Vec<TemplateTriple> = patterns
        .iter()
        .map(|p| (p.subject.clone(), p.predicate.clone(), p.object.clone()))
        .collect();
    delete_insert_where(store, dict, &template, &[], &Algebra::Bgp(patterns.to_vec()), cancellation)
}

/// Instantiates `template` against every matched binding, keeping only
/// triples where every position resolved: a template position referencing
/// a variable the solution left unbound is simply not produced for that
/// solution, and a constant that fails to encode under `encode` drops the
/// triple too (relevant for `DELETE`, where a never-seen constant cannot
/// already be stored).
fn instantiate_ground(
    template: &[TemplateTriple],
    matches: &[Binding],
    dict: &dyn Dictionary,
    encode: impl Fn(&dyn Dictionary, &Term) -> Option<u64>,
) -> Vec<IdTriple> {
    let mut out = Vec::new();
    for binding in matches {
        for (s, p, o) in template {
            let triple = (resolve_slot(s, binding), resolve_slot(p, binding), resolve_slot(o, binding));
            if let (Some(s), Some(p), Some(o)) = triple {
                if let (Some(s), Some(p), Some(o)) = (encode(dict, &s), encode(dict, &p), encode(dict, &o)) {
                    out.push(IdTriple::new(s, p, o));
                }
            }
        }
    }
    out
}

fn resolve_slot(slot: &TermOrVariable, binding: &Binding) -> Option<Term> {
    match slot {
        TermOrVariable::Term(t) => Some(t.clone()),
        TermOrVariable::Variable(v) => binding.get(v).cloned(),
    }
}

fn clear<S: TripleStore>(
    store: &S,
    target: &ClearTarget,
    silent: bool,
    cancellation: &Cancellation,
) -> Result<UpdateResult, ExecutionError> {
    match target {
        ClearTarget::Named => Ok(UpdateResult::default()),
        ClearTarget::Graph(name) => {
            if silent {
                Ok(UpdateResult::default())
            } else {
                Err(ExecutionError::InvalidClearTarget(name.clone()))
            }
        }
        ClearTarget::Default | ClearTarget::All => clear_default_graph(store, cancellation),
    }
}

fn clear_default_graph<S: TripleStore>(
    store: &S,
    cancellation: &Cancellation,
) -> Result<UpdateResult, ExecutionError> {
    let mut deleted = 0u64;
    loop {
        cancellation.check()?;
        let snapshot = store.snapshot();
        let chunk: Vec<IdTriple> = snapshot
            .scan(BoundPattern::default())
            .take(CLEAR_CHUNK_SIZE)
            .collect();
        if chunk.is_empty() {
            break;
        }
        deleted += chunk.len() as u64;
        drop(snapshot);
        store.delete_batch(&chunk)?;
    }
    Ok(UpdateResult {
        triples_inserted: 0,
        triples_deleted: deleted,
    })
}

fn drop_graph<S: TripleStore>(store: &S, silent: bool, cancellation: &Cancellation) -> Result<UpdateResult, ExecutionError> {
    let _ = silent;
    clear_default_graph(store, cancellation)
}
