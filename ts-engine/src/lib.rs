//! The public `Store` facade: an in-memory reference implementation that
//! wires the dictionary, triple store, algebra, optimizer, planner, and
//! executor crates together behind `query`/`stream_query`/`update`.

mod config;
mod error;
mod store;

pub use config::StoreConfig;
pub use error::{QueryError, UpdateError};
pub use store::{QueryOptions, QueryOutcome, Store};
