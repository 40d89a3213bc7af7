//! The cost-based join planner: cardinality estimation, an operator cost
//! model, join enumeration (exhaustive for small pattern counts, DP-ccp
//! above), and the normalized plan cache. Consumes the optimizer's
//! reordered, filter-pushed-down algebra tree and produces a `Plan` the
//! executor runs directly.

mod cache;
mod cardinality;
mod cost;
mod enumerate;
mod error;
mod plan;

pub use cache::{cache_key, CacheKey, CacheStats, PlanCache};
pub use cardinality::{estimate_join, estimate_multi_pattern, estimate_pattern, estimate_pattern_with_bindings};
pub use cost::{Cost, CostWeights, ScanKind};
pub use enumerate::build_join_plan;
pub use error::PlanError;
pub use plan::{JoinStrategy, Plan};
