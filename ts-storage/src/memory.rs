use crate::index::{BoundPattern, Index};
use crate::{Snapshot, StorageError, TripleStore};
use std::collections::BTreeSet;
use std::sync::RwLock;
use ts_common::Statistics;
use ts_model::IdTriple;

type Key = (u64, u64, u64);

/// An in-memory reference [`TripleStore`]: three `BTreeSet`s, one per
/// covering index, kept in lock-step. Snapshot isolation is implemented by
/// cloning the three sets under a single lock acquisition - cheap enough
/// for the data volumes this reference implementation is meant for, and a
/// query begun on a snapshot sees precisely the triples present at that
/// moment, unaffected by concurrent inserts/deletes.
#[derive(Default)]
pub struct MemoryTripleStore {
    inner: RwLock<Indices>,
}

#[derive(Default, Clone)]
struct Indices {
    spo: BTreeSet<Key>,
    pos: BTreeSet<Key>,
    osp: BTreeSet<Key>,
}

impl Indices {
    fn insert(&mut self, t: IdTriple) {
        self.spo.insert(Index::Spo.key_order(t.subject, t.predicate, t.object));
        self.pos.insert(Index::Pos.key_order(t.subject, t.predicate, t.object));
        self.osp.insert(Index::Osp.key_order(t.subject, t.predicate, t.object));
    }

    fn remove(&mut self, t: IdTriple) {
        self.spo.remove(&Index::Spo.key_order(t.subject, t.predicate, t.object));
        self.pos.remove(&Index::Pos.key_order(t.subject, t.predicate, t.object));
        self.osp.remove(&Index::Osp.key_order(t.subject, t.predicate, t.object));
    }
}

impl MemoryTripleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TripleStore for MemoryTripleStore {
    type Snapshot<'a> = MemorySnapshot;

    fn insert_batch(&self, triples: &[IdTriple]) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("triple store lock poisoned");
        for triple in triples {
            guard.insert(*triple);
        }
        Ok(())
    }

    fn delete_batch(&self, triples: &[IdTriple]) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("triple store lock poisoned");
        for triple in triples {
            guard.remove(*triple);
        }
        Ok(())
    }

    fn snapshot(&self) -> Self::Snapshot<'_> {
        let guard = self.inner.read().expect("triple store lock poisoned");
        MemorySnapshot {
            indices: guard.clone(),
        }
    }

    fn statistics(&self) -> Statistics {
        let guard = self.inner.read().expect("triple store lock poisoned");
        let mut stats = Statistics {
            total_triples: guard.spo.len() as u64,
            ..Statistics::default()
        };

        let mut subjects = std::collections::HashSet::new();
        let mut predicates = std::collections::HashSet::new();
        let mut objects = std::collections::HashSet::new();
        for &(s, p, o) in &guard.spo {
            subjects.insert(s);
            predicates.insert(p);
            objects.insert(o);
            *stats.predicate_histogram.entry(p).or_insert(0) += 1;
        }
        stats.distinct_subjects = subjects.len() as u64;
        stats.distinct_predicates = predicates.len() as u64;
        stats.distinct_objects = objects.len() as u64;
        stats
    }
}

/// A point-in-time snapshot of a [`MemoryTripleStore`].
pub struct MemorySnapshot {
    indices: Indices,
}

impl Snapshot for MemorySnapshot {
    fn scan(&self, pattern: BoundPattern) -> Box<dyn Iterator<Item = IdTriple> + '_> {
        let index = Index::select(&pattern);
        let set = match index {
            Index::Spo => &self.indices.spo,
            Index::Pos => &self.indices.pos,
            Index::Osp => &self.indices.osp,
        };

        let bound_in_key_order = match index {
            Index::Spo => (pattern.subject, pattern.predicate, pattern.object),
            Index::Pos => (pattern.predicate, pattern.object, pattern.subject),
            Index::Osp => (pattern.object, pattern.subject, pattern.predicate),
        };

        Box::new(set.iter().filter_map(move |&key| {
            let (s, p, o) = index.from_key_order(key);
            if let Some(want) = bound_in_key_order.0 {
                if want != key.0 {
                    return None;
                }
            }
            if let Some(want) = bound_in_key_order.1 {
                if want != key.1 {
                    return None;
                }
            }
            if let Some(want) = bound_in_key_order.2 {
                if want != key.2 {
                    return None;
                }
            }
            Some(IdTriple::new(s, p, o))
        }))
    }

    fn len(&self) -> usize {
        self.indices.spo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: u64, p: u64, o: u64) -> IdTriple {
        IdTriple::new(s, p, o)
    }

    #[test]
    fn insert_then_delete_restores_prior_state() {
        let store = MemoryTripleStore::new();
        store.insert_batch(&[t(1, 2, 3)]).unwrap();
        assert_eq!(store.snapshot().len(), 1);
        store.delete_batch(&[t(1, 2, 3)]).unwrap();
        assert_eq!(store.snapshot().len(), 0);
    }

    #[test]
    fn delete_of_absent_triple_is_noop() {
        let store = MemoryTripleStore::new();
        store.delete_batch(&[t(9, 9, 9)]).unwrap();
        assert_eq!(store.snapshot().len(), 0);
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let store = MemoryTripleStore::new();
        store.insert_batch(&[t(1, 2, 3)]).unwrap();
        store.insert_batch(&[t(1, 2, 3)]).unwrap();
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn scan_is_reachable_through_all_three_indices() {
        let store = MemoryTripleStore::new();
        store.insert_batch(&[t(1, 2, 3)]).unwrap();
        let snap = store.snapshot();

        assert_eq!(
            snap.scan(BoundPattern::new(Some(1), None, None)).count(),
            1
        );
        assert_eq!(
            snap.scan(BoundPattern::new(None, Some(2), None)).count(),
            1
        );
        assert_eq!(
            snap.scan(BoundPattern::new(None, None, Some(3))).count(),
            1
        );
        assert_eq!(snap.scan(BoundPattern::default()).count(), 1);
    }

    #[test]
    fn snapshot_does_not_see_later_writes() {
        let store = MemoryTripleStore::new();
        store.insert_batch(&[t(1, 2, 3)]).unwrap();
        let snap = store.snapshot();
        store.insert_batch(&[t(4, 5, 6)]).unwrap();
        assert_eq!(snap.len(), 1);
    }
}
