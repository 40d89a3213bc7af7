//! The ordered key-value triple store contract, plus an in-memory
//! reference implementation.
//!
//! Production storage (RocksDB-style, with real column families and an
//! atomic write-batch primitive) is an external collaborator the core
//! specification treats by contract only; [`MemoryTripleStore`] below
//! satisfies the same [`TripleStore`] trait well enough to drive tests and
//! the CLI.

mod index;
mod memory;

pub use index::{BoundPattern, Index};
pub use memory::{MemorySnapshot, MemoryTripleStore};

use std::error::Error;
use std::io;
use ts_common::Statistics;
use ts_model::IdTriple;

/// An error related to storage operations (reads, writes, ...).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

/// The write/read surface the executor and update sub-executor program
/// against. Every insert/delete touches all three covering indices
/// atomically (cross-index consistency is an invariant of the
/// specification's data model).
pub trait TripleStore: Send + Sync {
    type Snapshot<'a>: Snapshot
    where
        Self: 'a;

    /// Inserts every triple in `triples` into SPO, POS and OSP atomically.
    fn insert_batch(&self, triples: &[IdTriple]) -> Result<(), StorageError>;

    /// Deletes every triple in `triples` from SPO, POS and OSP atomically.
    /// Deleting an absent triple is a no-op.
    fn delete_batch(&self, triples: &[IdTriple]) -> Result<(), StorageError>;

    /// A read-only view of the store as it stands at the moment of the
    /// call; later writes to the store are not visible through it.
    fn snapshot(&self) -> Self::Snapshot<'_>;

    /// Aggregate statistics for the cost-based planner.
    fn statistics(&self) -> Statistics;
}

/// A point-in-time, read-only view of a [`TripleStore`].
pub trait Snapshot {
    /// Scans the covering index best suited to `pattern` (selected by how
    /// many of its leading positions are bound) and returns every
    /// matching triple.
    fn scan(&self, pattern: BoundPattern) -> Box<dyn Iterator<Item = IdTriple> + '_>;

    /// True if `triple` is present in this snapshot.
    fn contains(&self, triple: IdTriple) -> bool {
        let pattern = BoundPattern::new(
            Some(triple.subject),
            Some(triple.predicate),
            Some(triple.object),
        );
        self.scan(pattern).any(|t| t == triple)
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
