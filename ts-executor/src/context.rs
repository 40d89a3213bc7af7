use ts_common::Statistics;
use ts_dictionary::Dictionary;
use ts_planner::{CostWeights, PlanCache};
use ts_storage::Snapshot;

use crate::cancellation::Cancellation;

/// Everything a query or update needs to run: a read-only view of the
/// store, the dictionary it was encoded against, the statistics the
/// planner costs joins with, and the stop signal for this invocation.
///
/// Borrowed rather than owned: one `ExecutionContext` is built per query,
/// lives exactly as long as that query's execution, and is shared by every
/// operator in the binding-stream pipeline.
pub struct ExecutionContext<'ctx> {
    pub snapshot: &'ctx dyn Snapshot,
    pub dictionary: &'ctx dyn Dictionary,
    pub statistics: &'ctx Statistics,
    pub base_iri: Option<&'ctx str>,
    pub cost_weights: CostWeights,
    pub cancellation: Cancellation,
    /// Shared across queries (unlike everything else here, which is
    /// per-invocation); `None` in contexts - such as most unit tests and
    /// the `DELETE`/`INSERT WHERE` sub-executor - that have no reason to
    /// pay for a cache that will only ever see one lookup.
    pub plan_cache: Option<&'ctx PlanCache>,
}

impl<'ctx> ExecutionContext<'ctx> {
    pub fn new(
        snapshot: &'ctx dyn Snapshot,
        dictionary: &'ctx dyn Dictionary,
        statistics: &'ctx Statistics,
    ) -> Self {
        Self {
            snapshot,
            dictionary,
            statistics,
            base_iri: None,
            cost_weights: CostWeights::default(),
            cancellation: Cancellation::none(),
            plan_cache: None,
        }
    }

    pub fn with_base_iri(mut self, base_iri: Option<&'ctx str>) -> Self {
        self.base_iri = base_iri;
        self
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_plan_cache(mut self, plan_cache: &'ctx PlanCache) -> Self {
        self.plan_cache = Some(plan_cache);
        self
    }
}
