use crate::Dictionary;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use ts_model::Term;

/// An in-memory reference [`Dictionary`]. Good enough to drive tests and
/// the CLI; production deployments back the same trait with a persistent,
/// RocksDB-style store instead.
#[derive(Default)]
pub struct MemoryDictionary {
    by_term: DashMap<Term, u64>,
    by_id: DashMap<u64, Term>,
    next_id: AtomicU64,
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_term.is_empty()
    }
}

impl Dictionary for MemoryDictionary {
    fn lookup_id(&self, term: &Term) -> Option<u64> {
        self.by_term.get(term).map(|entry| *entry)
    }

    fn lookup_term(&self, id: u64) -> Option<Term> {
        self.by_id.get(&id).map(|entry| entry.clone())
    }

    fn get_or_create_id(&self, term: &Term) -> u64 {
        if let Some(id) = self.lookup_id(term) {
            return id;
        }
        // Dictionary ids use the `00` tag, so any allocation here already
        // carries the right kind bits for `term_kind` to see `Dict`.
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        match self.by_term.entry(term.clone()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => *existing.get(),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
                self.by_id.insert(id, term.clone());
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    #[test]
    fn same_term_always_returns_same_id() {
        let dict = MemoryDictionary::new();
        let term = Term::NamedNode(NamedNode::new("http://example.com/alice").unwrap());
        let a = dict.get_or_create_id(&term);
        let b = dict.get_or_create_id(&term);
        assert_eq!(a, b);
    }

    #[test]
    fn ids_are_never_reused() {
        let dict = MemoryDictionary::new();
        let a = dict.get_or_create_id(&Term::Literal(Literal::new_simple_literal("a")));
        let b = dict.get_or_create_id(&Term::Literal(Literal::new_simple_literal("b")));
        assert_ne!(a, b);
    }

    #[test]
    fn lookup_term_recovers_the_original() {
        let dict = MemoryDictionary::new();
        let term = Term::Literal(Literal::new_simple_literal("hello"));
        let id = dict.get_or_create_id(&term);
        assert_eq!(dict.lookup_term(id), Some(term));
    }

    #[test]
    fn unknown_term_is_not_found_without_creating() {
        let dict = MemoryDictionary::new();
        let term = Term::Literal(Literal::new_simple_literal("never inserted"));
        assert_eq!(dict.lookup_id(&term), None);
    }
}
