/// Relative weights for the operator cost model, all configurable; the
/// defaults are the ones named in §4.4.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostWeights {
    pub comparison: f64,
    pub hash: f64,
    pub hash_probe: f64,
    pub index_seek: f64,
    pub sequential_read: f64,
    pub leapfrog_seek: f64,
    pub leapfrog_comparison: f64,
    pub memory_weight: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        CostWeights {
            comparison: 1.0,
            hash: 2.0,
            hash_probe: 1.5,
            index_seek: 10.0,
            sequential_read: 0.1,
            leapfrog_seek: 5.0,
            leapfrog_comparison: 1.5,
            memory_weight: 1.0,
        }
    }
}

/// A cost estimate for a single plan node. All components are
/// non-negative; `total` is always `cpu + io + memory`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cost {
    pub cpu: f64,
    pub io: f64,
    pub memory: f64,
    pub total: f64,
}

impl Cost {
    pub fn new(cpu: f64, io: f64, memory: f64) -> Self {
        Cost {
            cpu,
            io,
            memory,
            total: cpu + io + memory,
        }
    }

    pub fn zero() -> Self {
        Cost::new(0.0, 0.0, 0.0)
    }

    pub fn combine(self, other: Cost) -> Cost {
        Cost::new(self.cpu + other.cpu, self.io + other.io, self.memory + other.memory)
    }
}

/// The kind of index access a scan performs, derived from how many
/// positions of the pattern are already bound to a constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanKind {
    Point,
    Prefix,
    Full,
}

impl ScanKind {
    pub fn from_bound_positions(bound_positions: usize) -> Self {
        match bound_positions {
            3 => ScanKind::Point,
            0 => ScanKind::Full,
            _ => ScanKind::Prefix,
        }
    }
}

/// Cost of scanning a single triple pattern through a covering index.
/// `output_cardinality` is the estimated number of matching triples;
/// `total_triples` is the store's total size (used for a full scan's
/// cost, which is independent of selectivity). `needs_post_filter` is set
/// for subject+object-bound, predicate-unbound patterns (`S?O`), which no
/// covering index serves directly - matching rows are found via the SPO
/// index restricted to the subject and then filtered on the object.
pub fn pattern_scan_cost(
    kind: ScanKind,
    output_cardinality: f64,
    total_triples: f64,
    needs_post_filter: bool,
    weights: &CostWeights,
) -> Cost {
    let mut cost = match kind {
        ScanKind::Point => Cost::new(weights.comparison, weights.index_seek, 0.0),
        ScanKind::Prefix => Cost::new(
            output_cardinality * weights.comparison,
            weights.index_seek + output_cardinality * weights.sequential_read,
            0.0,
        ),
        ScanKind::Full => Cost::new(
            total_triples * weights.comparison,
            total_triples * weights.sequential_read,
            0.0,
        ),
    };
    if needs_post_filter {
        cost = cost.combine(Cost::new(output_cardinality * 2.0 * weights.comparison, 0.0, 0.0));
    }
    cost
}

pub fn filter_cost(input_cardinality: f64, weights: &CostWeights) -> Cost {
    Cost::new(input_cardinality * weights.comparison, 0.0, 0.0)
}

pub fn nested_loop_join_cost(left_card: f64, right_card: f64, weights: &CostWeights) -> Cost {
    Cost::new(
        left_card * right_card * weights.comparison,
        0.0,
        right_card * weights.memory_weight,
    )
}

/// Cost of a hash join that builds a table over `build_card` rows and
/// probes it with `probe_card` rows. Strategy selection tries both
/// orderings and keeps the cheaper one.
pub fn hash_join_cost(build_card: f64, probe_card: f64, weights: &CostWeights) -> Cost {
    Cost::new(
        build_card * weights.hash + probe_card * weights.hash_probe,
        0.0,
        build_card * weights.memory_weight,
    )
}

/// Cost of a leapfrog-triejoin over `k` patterns sharing variables, with
/// `output_cardinality` the estimated join output size, `per_pattern_card`
/// each pattern's own cardinality, and `total_triples` the store size
/// (used in the `log2` seek-depth term).
pub fn leapfrog_cost(
    output_cardinality: f64,
    k: usize,
    per_pattern_card: &[f64],
    total_triples: f64,
    weights: &CostWeights,
) -> Cost {
    let log_depth = total_triples.max(2.0).log2();
    let cpu = output_cardinality
        * k as f64
        * (weights.leapfrog_seek * log_depth + weights.leapfrog_comparison);
    let io: f64 = per_pattern_card
        .iter()
        .map(|card| (output_cardinality / card.max(1.0)) * weights.leapfrog_seek)
        .sum();
    let memory = k as f64 * weights.memory_weight;
    Cost::new(cpu, io, memory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_scan_is_cheaper_than_full_scan() {
        let weights = CostWeights::default();
        let point = pattern_scan_cost(ScanKind::Point, 1.0, 10_000.0, false, &weights);
        let full = pattern_scan_cost(ScanKind::Full, 10_000.0, 10_000.0, false, &weights);
        assert!(point.total < full.total);
    }

    #[test]
    fn s_bound_o_bound_pattern_adds_post_filter_cost() {
        let weights = CostWeights::default();
        let without = pattern_scan_cost(ScanKind::Prefix, 100.0, 10_000.0, false, &weights);
        let with = pattern_scan_cost(ScanKind::Prefix, 100.0, 10_000.0, true, &weights);
        assert!(with.cpu > without.cpu);
    }

    #[test]
    fn cost_total_is_the_sum_of_components() {
        let cost = Cost::new(1.0, 2.0, 3.0);
        assert_eq!(cost.total, 6.0);
    }
}
