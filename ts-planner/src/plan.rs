use crate::cost::Cost;
use ts_model::{TriplePattern, Variable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinStrategy {
    NestedLoop,
    /// `build_left` records which side the hash table was built over -
    /// the smaller side wins, per §4.4's "try both orderings".
    Hash { build_left: bool },
}

/// A physical plan: `Scan`/`Join`/`Leapfrog` nodes, each carrying its own
/// estimated cardinality and cost breakdown so the executor and `explain`
/// output can report both without recomputing.
#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    Scan {
        pattern: TriplePattern,
        cardinality: f64,
        cost: Cost,
    },
    Join {
        strategy: JoinStrategy,
        left: Box<Plan>,
        right: Box<Plan>,
        join_vars: Vec<Variable>,
        cardinality: f64,
        cost: Cost,
    },
    Leapfrog {
        patterns: Vec<TriplePattern>,
        vars: Vec<Variable>,
        cardinality: f64,
        cost: Cost,
    },
}

impl Plan {
    pub fn cardinality(&self) -> f64 {
        match self {
            Plan::Scan { cardinality, .. }
            | Plan::Join { cardinality, .. }
            | Plan::Leapfrog { cardinality, .. } => *cardinality,
        }
    }

    pub fn cost(&self) -> Cost {
        match self {
            Plan::Scan { cost, .. } | Plan::Join { cost, .. } | Plan::Leapfrog { cost, .. } => *cost,
        }
    }

    /// The triple patterns this plan eventually scans, in plan order
    /// (left-to-right for a join tree).
    pub fn patterns(&self) -> Vec<&TriplePattern> {
        match self {
            Plan::Scan { pattern, .. } => vec![pattern],
            Plan::Join { left, right, .. } => {
                let mut out = left.patterns();
                out.extend(right.patterns());
                out
            }
            Plan::Leapfrog { patterns, .. } => patterns.iter().collect(),
        }
    }
}
