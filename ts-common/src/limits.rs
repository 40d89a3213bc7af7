//! The numeric limits named in the external interfaces section of the
//! specification. Centralized here so every crate that needs to enforce
//! one enforces the same value.

/// Maximum algebra tree recursion depth before any traversal fails.
pub const MAX_DEPTH: usize = 100;

/// Maximum triples accepted by a single `INSERT DATA`/`DELETE DATA`.
pub const MAX_DATA_TRIPLES: usize = 100_000;

/// Maximum triples in either template of a `DELETE/INSERT WHERE`.
pub const MAX_TEMPLATE_TRIPLES: usize = 1_000;

/// Maximum bindings a `WHERE` pattern may produce before an update fails.
pub const MAX_PATTERN_MATCHES: usize = 1_000_000;

/// Chunk size used when streaming a full-store `CLEAR`.
pub const CLEAR_CHUNK_SIZE: usize = 10_000;

/// Maximum byte length of a `REGEX`/`REPLACE` pattern.
pub const MAX_REGEX_PATTERN_BYTES: usize = 1_000;

/// Wall-clock timeout for a single regex match/replace invocation.
pub const REGEX_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

/// Default plan cache capacity.
pub const DEFAULT_PLAN_CACHE_SIZE: usize = 1_000;

/// Join patterns at or below this count are enumerated exhaustively;
/// above it, DP-ccp is used.
pub const EXHAUSTIVE_JOIN_ENUMERATION_LIMIT: usize = 5;
