//! Lazy pull-based binding streams over a triple store snapshot: BGP/join
//! execution, the relational-style modifier operators, GROUP BY, the
//! top-level algebra dispatcher, query-result serialization (SELECT/ASK/
//! CONSTRUCT/DESCRIBE), and the UPDATE sub-executor.

mod bgp;
mod cancellation;
mod context;
mod error;
mod execute;
mod group;
mod operators;
mod results;
mod stream;
mod update;

pub use cancellation::{Cancellation, CancellationHandle};
pub use context::ExecutionContext;
pub use error::ExecutionError;
pub use execute::execute;
pub use results::{execute_query, QueryResults};
pub use stream::{drain, drain_at_most, drain_capped, BindingStream};
pub use update::{execute_update, ClearTarget, GroundTriple, TemplateTriple, UpdateOperation, UpdateResult};
