use crate::error::OptimizeError;
use crate::{fold, pushdown, reorder};
use ts_algebra::Algebra;
use ts_common::Statistics;
use ts_dictionary::Dictionary;

/// A record of what each optimizer pass did to a tree, without mutating
/// the caller's copy - the supplemented `EXPLAIN`-style surface named in
/// the expanded specification.
#[derive(Clone, Debug, PartialEq)]
pub struct Explanation {
    pub original: String,
    pub after_constant_folding: PassReport,
    pub after_reordering: PassReport,
    pub after_filter_pushdown: PassReport,
    pub final_tree: String,
    pub triple_count: usize,
    pub filter_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    pub changed: bool,
    pub reason: String,
    pub tree: String,
}

/// Runs the full pipeline, the same as [`crate::optimize`], but keeps each
/// intermediate tree and reports whether every pass actually changed
/// anything.
pub fn explain(
    tree: &Algebra,
    stats: &Statistics,
    dict: &dyn Dictionary,
) -> Result<Explanation, OptimizeError> {
    let original = tree.to_string();

    let folded = fold::constant_fold(tree)?;
    let after_constant_folding = PassReport {
        changed: folded != *tree,
        reason: if folded != *tree {
            "folded constant subexpressions and/or collapsed empty-BGP subtrees".to_string()
        } else {
            "no constant subexpressions to fold".to_string()
        },
        tree: folded.to_string(),
    };

    let reordered = reorder::reorder_bgps(&folded, stats, dict)?;
    let after_reordering = PassReport {
        changed: reordered != folded,
        reason: if reordered != folded {
            "reordered one or more BGPs by selectivity".to_string()
        } else {
            "pattern order already selectivity-optimal, or no BGP had more than one pattern"
                .to_string()
        },
        tree: reordered.to_string(),
    };

    let pushed = pushdown::push_down_filters(&reordered)?;
    let after_filter_pushdown = PassReport {
        changed: pushed != reordered,
        reason: if pushed != reordered {
            "pushed one or more filter conjuncts closer to the patterns they constrain"
                .to_string()
        } else {
            "no filter present, or none could be pushed further".to_string()
        },
        tree: pushed.to_string(),
    };

    Ok(Explanation {
        original,
        triple_count: ts_algebra::triple_count(&pushed),
        filter_count: ts_algebra::collect_filters(&pushed).len(),
        final_tree: pushed.to_string(),
        after_constant_folding,
        after_reordering,
        after_filter_pushdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::xsd;
    use oxrdf::Literal;
    use ts_algebra::Expr;
    use ts_dictionary::MemoryDictionary;
    use ts_model::Term;

    #[test]
    fn explain_reports_no_change_for_an_already_optimal_empty_bgp() {
        let dict = MemoryDictionary::default();
        let stats = Statistics::default();
        let tree = Algebra::Bgp(vec![]);
        let explanation = explain(&tree, &stats, &dict).unwrap();
        assert!(!explanation.after_constant_folding.changed);
        assert!(!explanation.after_reordering.changed);
        assert!(!explanation.after_filter_pushdown.changed);
        assert_eq!(explanation.triple_count, 0);
    }

    #[test]
    fn explain_reports_constant_folding_changed_the_tree() {
        let dict = MemoryDictionary::default();
        let stats = Statistics::default();
        let tree = Algebra::Filter(
            Expr::Term(Term::Literal(Literal::new_typed_literal("true", xsd::BOOLEAN))),
            Box::new(Algebra::Bgp(vec![])),
        );
        let explanation = explain(&tree, &stats, &dict).unwrap();
        assert!(explanation.after_constant_folding.changed);
        assert_eq!(explanation.filter_count, 0);
    }
}
