use rustc_hash::FxHashMap;

/// Store-derived statistics consumed by the cost-based planner.
///
/// Produced by whatever backs the triple store (the in-memory reference
/// store in this workspace, or a production RocksDB-style store outside
/// it); the planner only ever reads one of these.
#[derive(Clone, Debug, Default)]
pub struct Statistics {
    pub total_triples: u64,
    pub distinct_subjects: u64,
    pub distinct_predicates: u64,
    pub distinct_objects: u64,
    /// Triple count per predicate id, for predicates that have one.
    pub predicate_histogram: FxHashMap<u64, u64>,
    /// Predicates with a numeric range index available for selectivity
    /// refinement during BGP reordering.
    pub range_indexed_predicates: FxHashMap<u64, bool>,
}

impl Statistics {
    pub fn predicate_triple_count(&self, predicate: u64) -> Option<u64> {
        self.predicate_histogram.get(&predicate).copied()
    }

    pub fn has_range_index(&self, predicate: u64) -> bool {
        self.range_indexed_predicates
            .get(&predicate)
            .copied()
            .unwrap_or(false)
    }
}
