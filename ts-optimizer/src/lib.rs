//! The rule-based optimizer pipeline: constant folding, BGP reordering by
//! estimated selectivity, and filter push-down. Runs once per compiled
//! query, ahead of planning; produces an equivalent (per testable property
//! 2) but cheaper-to-execute algebra tree.

mod error;
mod explain;
mod fold;
mod pushdown;
mod reorder;

pub use error::OptimizeError;
pub use explain::{explain, Explanation, PassReport};
pub use fold::fold_expr;

use ts_algebra::Algebra;
use ts_common::Statistics;
use ts_dictionary::Dictionary;

/// Runs the fixed three-pass pipeline: constant folding, then BGP
/// reordering, then filter push-down. The pipeline is idempotent -
/// running it again on its own output returns an unchanged tree (testable
/// property 1) - because each pass only ever removes slack a prior pass
/// could have introduced, never adds new opportunities for an earlier
/// pass to find.
pub fn optimize(
    tree: &Algebra,
    stats: &Statistics,
    dict: &dyn Dictionary,
) -> Result<Algebra, OptimizeError> {
    let folded = fold::constant_fold(tree)?;
    let reordered = reorder::reorder_bgps(&folded, stats, dict)?;
    pushdown::push_down_filters(&reordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;
    use ts_algebra::Expr;
    use ts_dictionary::MemoryDictionary;
    use ts_model::{Term, TermOrVariable, TriplePattern, Variable};

    fn pattern(s: &str, p: &str, o: &str) -> TriplePattern {
        TriplePattern::new(
            TermOrVariable::Variable(Variable::new(s).unwrap()),
            TermOrVariable::Variable(Variable::new(p).unwrap()),
            TermOrVariable::Variable(Variable::new(o).unwrap()),
        )
    }

    #[test]
    fn optimizing_twice_is_the_same_as_optimizing_once() {
        let dict = MemoryDictionary::default();
        let stats = Statistics::default();

        let tree = Algebra::Filter(
            Expr::Equal(
                Box::new(Expr::Variable(Variable::new("a").unwrap())),
                Box::new(Expr::Term(Term::NamedNode(NamedNode::new("http://ex/v").unwrap()))),
            ),
            Box::new(Algebra::join(
                Algebra::bgp(vec![pattern("a", "p1", "x")]),
                Algebra::bgp(vec![pattern("b", "p2", "y")]),
            )),
        );

        let once = optimize(&tree, &stats, &dict).unwrap();
        let twice = optimize(&once, &stats, &dict).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_bgp_through_the_full_pipeline_stays_empty() {
        let dict = MemoryDictionary::default();
        let stats = Statistics::default();
        let tree = Algebra::Bgp(vec![]);
        assert_eq!(optimize(&tree, &stats, &dict).unwrap(), Algebra::Bgp(vec![]));
    }
}
