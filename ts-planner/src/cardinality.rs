use std::collections::HashSet;
use ts_common::Statistics;
use ts_dictionary::Dictionary;
use ts_model::{Term, TermOrVariable, TriplePattern, Variable};

/// Estimated cardinality of a single triple pattern against `stats`. Uses
/// the predicate's histogram entry as a base when the predicate is a
/// bound IRI the store has seen; otherwise falls back to the store's
/// total triple count. Subject and object selectivity then each multiply
/// the base by `1/distinct_count(position)` when bound, or leave it
/// unchanged when the position is an unbound variable.
pub fn estimate_pattern(pattern: &TriplePattern, stats: &Statistics, dict: &dyn Dictionary) -> f64 {
    estimate_pattern_with_bindings(pattern, &HashSet::new(), stats, dict)
}

/// As [`estimate_pattern`], but a variable already present in
/// `bound_vars` (bound by a preceding pattern in the same BGP) is treated
/// like a bound constant for selectivity purposes: its remaining domain
/// is a single concrete value, so it narrows the estimate the same way a
/// literal constant in that position would.
pub fn estimate_pattern_with_bindings(
    pattern: &TriplePattern,
    bound_vars: &HashSet<Variable>,
    stats: &Statistics,
    dict: &dyn Dictionary,
) -> f64 {
    let total = stats.total_triples.max(1) as f64;
    let base = match &pattern.predicate {
        TermOrVariable::Term(Term::NamedNode(iri)) => dict
            .resolve(&Term::NamedNode(iri.clone()))
            .and_then(|id| stats.predicate_triple_count(id))
            .map(|count| count as f64)
            .unwrap_or(total),
        _ => total,
    };

    let mut card = base;
    card *= position_selectivity(&pattern.subject, bound_vars, stats.distinct_subjects);
    card *= position_selectivity(&pattern.object, bound_vars, stats.distinct_objects);
    card.max(1.0)
}

fn position_selectivity(
    slot: &TermOrVariable,
    bound_vars: &HashSet<Variable>,
    distinct_count: u64,
) -> f64 {
    let is_effectively_bound = match slot {
        TermOrVariable::Term(_) => true,
        TermOrVariable::Variable(v) => bound_vars.contains(v),
    };
    if is_effectively_bound {
        1.0 / (distinct_count.max(1) as f64)
    } else {
        1.0
    }
}

/// Estimated domain size of a variable given the cardinality of the
/// relation it comes from: `min(sqrt(card), total_triples)`.
fn estimated_domain(card: f64, total_triples: f64) -> f64 {
    card.sqrt().min(total_triples).max(1.0)
}

/// Estimated cardinality of joining two relations of the given sizes over
/// `join_vars`. With no shared variables this is the Cartesian product;
/// otherwise each shared variable divides the product by the larger
/// side's estimated domain for that variable.
pub fn estimate_join(
    left_card: f64,
    right_card: f64,
    join_vars: &[Variable],
    stats: &Statistics,
) -> f64 {
    let total = stats.total_triples.max(1) as f64;
    if join_vars.is_empty() {
        return (left_card * right_card).max(1.0);
    }
    let mut card = left_card * right_card;
    let left_domain = estimated_domain(left_card, total);
    let right_domain = estimated_domain(right_card, total);
    for _ in join_vars {
        card /= left_domain.max(right_domain);
    }
    card.max(1.0)
}

/// Folds cardinality estimation left-to-right across a BGP's patterns,
/// accumulating the set of variables already bound by preceding patterns.
pub fn estimate_multi_pattern(
    patterns: &[TriplePattern],
    stats: &Statistics,
    dict: &dyn Dictionary,
) -> f64 {
    let mut bound: HashSet<Variable> = HashSet::new();
    let mut accumulated: Option<f64> = None;

    for pattern in patterns {
        let pattern_card = estimate_pattern_with_bindings(pattern, &bound, stats, dict);
        accumulated = Some(match accumulated {
            None => pattern_card,
            Some(prev) => {
                let join_vars: Vec<Variable> = pattern
                    .variables()
                    .into_iter()
                    .filter(|v| bound.contains(v))
                    .cloned()
                    .collect();
                estimate_join(prev, pattern_card, &join_vars, stats)
            }
        });
        for v in pattern.variables() {
            bound.insert(v.clone());
        }
    }
    accumulated.unwrap_or(1.0).max(1.0)
}
