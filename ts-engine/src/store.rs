use std::time::Duration;

use ts_algebra::{CompiledQuery, ParsedQuery};
use ts_common::Statistics;
use ts_dictionary::{Dictionary, MemoryDictionary};
use ts_executor::{
    execute_query, execute_update, Cancellation, ExecutionContext, QueryResults, UpdateOperation,
};
use ts_optimizer::Explanation;
use ts_planner::PlanCache;
use ts_storage::{MemoryTripleStore, TripleStore};

use crate::config::StoreConfig;
use crate::error::{QueryError, UpdateError};

/// Per-call options for [`Store::query`]/[`Store::stream_query`].
/// `timeout_ms: None` falls back to [`StoreConfig::default_timeout`].
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    pub timeout_ms: Option<u64>,
    pub explain: bool,
    pub optimize: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self {
            timeout_ms: None,
            explain: false,
            optimize: true,
        }
    }
}

/// What `query` returns: either the serialized results, or - when
/// `options.explain` is set - a report of what the optimizer did instead
/// of running the query at all.
#[derive(Debug)]
pub enum QueryOutcome {
    Results(QueryResults),
    Explain(Explanation),
}

/// An in-memory reference implementation of the full query/update
/// pipeline: dictionary, triple store, shared plan cache, and the
/// optimizer/planner/executor crates wired together behind one facade.
/// Synchronous throughout, since nothing in this workspace's dependency
/// stack pulls in an async runtime.
pub struct Store {
    dictionary: MemoryDictionary,
    triples: MemoryTripleStore,
    plan_cache: PlanCache,
    config: StoreConfig,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            dictionary: MemoryDictionary::new(),
            triples: MemoryTripleStore::new(),
            plan_cache: PlanCache::new(config.plan_cache_capacity),
            config,
        }
    }

    pub fn dictionary(&self) -> &MemoryDictionary {
        &self.dictionary
    }

    pub fn triples(&self) -> &MemoryTripleStore {
        &self.triples
    }

    pub fn plan_cache_stats(&self) -> ts_planner::CacheStats {
        self.plan_cache.stats()
    }

    /// Runs one compiled query to completion, returning either serialized
    /// results or (with `options.explain`) an optimizer explanation.
    /// `explain` always needs the full tree regardless of query type, so
    /// this is eager by design rather than streaming.
    pub fn query(&self, parsed: ParsedQuery, options: QueryOptions) -> Result<QueryOutcome, QueryError> {
        let compiled = ts_algebra::compile(parsed)?;
        let stats = self.triples.statistics();

        if options.explain {
            let explanation = ts_optimizer::explain(&compiled.pattern, &stats, &self.dictionary)?;
            return Ok(QueryOutcome::Explain(explanation));
        }

        let pattern = if options.optimize {
            ts_optimizer::optimize(&compiled.pattern, &stats, &self.dictionary)?
        } else {
            compiled.pattern.clone()
        };
        let compiled = CompiledQuery { pattern, ..compiled };

        let cancellation = self.cancellation_for(options.timeout_ms);
        let snapshot = self.triples.snapshot();
        let ctx = ExecutionContext::new(&snapshot, &self.dictionary, &stats)
            .with_base_iri(compiled.base_iri.as_deref())
            .with_cancellation(cancellation)
            .with_plan_cache(&self.plan_cache);

        let results = execute_query(&compiled, &ctx)?;
        Ok(QueryOutcome::Results(results))
    }

    /// SELECT-only: same pipeline as [`Store::query`], but the binding
    /// sequence is drained into an owned `Vec` up front rather than kept
    /// lazy past this call. Exposing the executor's true lazy stream
    /// across this boundary would require either an `Arc`-based rewrite
    /// of `ExecutionContext` or a self-referential container to keep the
    /// snapshot alive alongside the stream that borrows it; neither is
    /// worth the complexity for a reference engine, so the "only pull
    /// what you consume" guarantee holds internally (every operator is
    /// still a plain iterator) but not across this particular API edge.
    pub fn stream_query(
        &self,
        parsed: ParsedQuery,
        options: QueryOptions,
    ) -> Result<std::vec::IntoIter<ts_model::Binding>, QueryError> {
        let compiled = ts_algebra::compile(parsed)?;
        if compiled.query_type != ts_algebra::QueryType::Select {
            return Err(ts_executor::ExecutionError::UnsupportedPattern(
                "stream_query only supports SELECT".to_string(),
            )
            .into());
        }

        let stats = self.triples.statistics();
        let pattern = if options.optimize {
            ts_optimizer::optimize(&compiled.pattern, &stats, &self.dictionary)?
        } else {
            compiled.pattern.clone()
        };

        let cancellation = self.cancellation_for(options.timeout_ms);
        let snapshot = self.triples.snapshot();
        let ctx = ExecutionContext::new(&snapshot, &self.dictionary, &stats)
            .with_base_iri(compiled.base_iri.as_deref())
            .with_cancellation(cancellation.clone())
            .with_plan_cache(&self.plan_cache);

        let stream = ts_executor::execute(&pattern, &ctx, ts_model::Binding::empty())?;
        let rows = ts_executor::drain(stream, &cancellation)?;
        Ok(rows.into_iter())
    }

    /// Runs a sequence of update operations one at a time. Per §4.5.1, a
    /// single operation is atomic but the sequence is not: if operation
    /// `k` fails, operations `0..k` are not rolled back. Returns the
    /// total affected-triple count (inserts + deletes) across whatever
    /// operations did complete, paired with the first error if any did
    /// not.
    pub fn update(&self, operations: &[UpdateOperation]) -> Result<u64, UpdateError> {
        let cancellation = self.cancellation_for(None);
        let mut affected = 0u64;
        for op in operations {
            let result = execute_update(&self.triples, &self.dictionary, op, &cancellation)?;
            affected += result.triples_inserted + result.triples_deleted;
            self.plan_cache.invalidate();
        }
        Ok(affected)
    }

    fn cancellation_for(&self, timeout_ms: Option<u64>) -> Cancellation {
        let timeout = timeout_ms
            .map(Duration::from_millis)
            .or(self.config.default_timeout);
        match timeout {
            Some(timeout) => Cancellation::with_timeout(timeout),
            None => Cancellation::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;
    use ts_algebra::{Algebra, QueryType};
    use ts_model::{Term, TermOrVariable, TriplePattern, Variable};

    fn iri(s: &str) -> Term {
        Term::NamedNode(NamedNode::new(s).unwrap())
    }

    fn var(name: &str) -> TermOrVariable {
        TermOrVariable::Variable(Variable::new(name).unwrap())
    }

    fn insert_one(store: &Store) {
        let s = store.dictionary.resolve_or_create(&iri("http://ex/alice"));
        let p = store.dictionary.resolve_or_create(&iri("http://ex/knows"));
        let o = store.dictionary.resolve_or_create(&iri("http://ex/bob"));
        store
            .triples
            .insert_batch(&[ts_model::IdTriple::new(s, p, o)])
            .unwrap();
    }

    fn select_all() -> ParsedQuery {
        ParsedQuery {
            query_type: QueryType::Select,
            pattern: Algebra::bgp(vec![TriplePattern::new(var("s"), var("p"), var("o"))]),
            dataset: vec![],
            base_iri: None,
            template: vec![],
        }
    }

    #[test]
    fn query_select_returns_one_row_for_one_triple() {
        let store = Store::new();
        insert_one(&store);

        let outcome = store.query(select_all(), QueryOptions::new()).unwrap();
        match outcome {
            QueryOutcome::Results(QueryResults::Select { rows, .. }) => assert_eq!(rows.len(), 1),
            other => panic!("expected Select results, got {other:?}"),
        }
    }

    #[test]
    fn explain_reports_without_running_the_query() {
        let store = Store::new();
        let mut opts = QueryOptions::new();
        opts.explain = true;
        let outcome = store.query(select_all(), opts).unwrap();
        assert!(matches!(outcome, QueryOutcome::Explain(_)));
    }

    #[test]
    fn stream_query_rejects_non_select() {
        let store = Store::new();
        let mut parsed = select_all();
        parsed.query_type = QueryType::Ask;
        let err = store.stream_query(parsed, QueryOptions::new()).unwrap_err();
        assert_eq!(err.kind(), ts_common::ErrorKind::UnsupportedPattern);
    }

    #[test]
    fn update_insert_data_then_query_sees_it() {
        let store = Store::new();
        let op = UpdateOperation::InsertData(vec![(
            iri("http://ex/alice"),
            iri("http://ex/knows"),
            iri("http://ex/bob"),
        )]);
        let affected = store.update(&[op]).unwrap();
        assert_eq!(affected, 1);

        let outcome = store.query(select_all(), QueryOptions::new()).unwrap();
        match outcome {
            QueryOutcome::Results(QueryResults::Select { rows, .. }) => assert_eq!(rows.len(), 1),
            other => panic!("expected Select results, got {other:?}"),
        }
    }
}
