//! The term dictionary: a bidirectional term<->id mapping, plus the inline
//! integer/decimal/datetime encoding primitives that let small numeric and
//! temporal values be carried directly in the 64-bit id without a
//! dictionary round-trip.
//!
//! The dictionary *contract* (the `Dictionary` trait) is what the rest of
//! the engine programs against; the production implementation is an
//! external collaborator (an on-disk, RocksDB-backed dictionary) that this
//! crate does not provide. `MemoryDictionary` is a reference implementation
//! good enough to drive tests and the CLI.

mod inline;
mod memory;

pub use inline::{decode_datetime, decode_decimal, decode_integer};
pub use inline::{encode_datetime, encode_decimal, encode_integer};
pub use inline::{inline_encoded, term_kind, try_inline_encode, TermKind};
pub use memory::MemoryDictionary;

use ts_model::Term;

/// The term<->id dictionary contract.
///
/// Implementations must be append-only (an id, once assigned, is never
/// reused or rewritten) and must make `get_or_create_id` linearizable: the
/// same term always maps to the same id, and concurrent first-time lookups
/// for a new term assign exactly one id.
pub trait Dictionary: Send + Sync {
    /// Looks up the id of a term that is known to already be in the
    /// dictionary, without creating one.
    fn lookup_id(&self, term: &Term) -> Option<u64>;

    /// Looks up the term behind a dictionary id.
    fn lookup_term(&self, id: u64) -> Option<Term>;

    /// Returns the id for `term`, assigning a new dictionary id if this is
    /// the first time `term` has been seen. Does not consult the inline
    /// encoding; callers should try [`try_inline_encode`] first.
    fn get_or_create_id(&self, term: &Term) -> u64;

    /// Resolves `term` to an id, using the inline encoding when the term is
    /// representable inline and falling back to dictionary lookup (without
    /// creating) otherwise. Returns `None` if the term is inline-eligible
    /// in kind but out of the representable range, or a dictionary term
    /// with no entry yet.
    fn resolve(&self, term: &Term) -> Option<u64> {
        try_inline_encode(term).or_else(|| self.lookup_id(term))
    }

    /// Like [`Dictionary::resolve`] but creates a dictionary entry when
    /// `term` does not inline-encode and has not been seen before.
    fn resolve_or_create(&self, term: &Term) -> u64 {
        try_inline_encode(term).unwrap_or_else(|| self.get_or_create_id(term))
    }

    /// Decodes an id back into a term, trying the inline encodings first.
    fn decode(&self, id: u64) -> Option<Term> {
        inline::decode_term(id).or_else(|| self.lookup_term(id))
    }
}
