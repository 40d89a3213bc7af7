use std::time::Duration;

use ts_common::limits::DEFAULT_PLAN_CACHE_SIZE;
use ts_planner::CostWeights;

/// Construction-time settings for a [`crate::Store`]. Deliberately a plain
/// struct with a `Default` rather than anything that loads from the
/// environment or a config file; `ts-cli` is the layer that turns
/// command-line flags into one of these.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Entry capacity of the shared plan cache. See
    /// [`ts_common::limits::DEFAULT_PLAN_CACHE_SIZE`].
    pub plan_cache_capacity: usize,
    /// Applied to every `query`/`stream_query`/`update` call that does not
    /// specify its own `timeout_ms` in its options.
    pub default_timeout: Option<Duration>,
    pub cost_weights: CostWeights,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            plan_cache_capacity: DEFAULT_PLAN_CACHE_SIZE,
            default_timeout: None,
            cost_weights: CostWeights::default(),
        }
    }
}
