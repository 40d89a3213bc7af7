use crate::cardinality::{estimate_join, estimate_pattern_with_bindings};
use crate::cost::{hash_join_cost, leapfrog_cost, nested_loop_join_cost, pattern_scan_cost, CostWeights, ScanKind};
use crate::error::PlanError;
use crate::plan::{JoinStrategy, Plan};
use itertools::Itertools;
use std::collections::HashSet;
use ts_common::limits::EXHAUSTIVE_JOIN_ENUMERATION_LIMIT;
use ts_common::Statistics;
use ts_dictionary::Dictionary;
use ts_model::{TermOrVariable, TriplePattern, Variable};

/// Builds the cheapest join plan over `patterns`: exhaustive permutation
/// search for small pattern counts, DP-ccp for larger ones.
pub fn build_join_plan(
    patterns: &[TriplePattern],
    stats: &Statistics,
    dict: &dyn Dictionary,
    weights: &CostWeights,
) -> Result<Plan, PlanError> {
    if patterns.is_empty() {
        return Err(PlanError::EmptyPatterns);
    }
    if patterns.len() == 1 {
        return Ok(scan_plan(&patterns[0], &HashSet::new(), stats, dict, weights));
    }

    let mut best = if patterns.len() <= EXHAUSTIVE_JOIN_ENUMERATION_LIMIT {
        exhaustive_enumerate(patterns, stats, dict, weights)?
    } else {
        dp_ccp(patterns, stats, dict, weights)?
    };

    if let Some(leapfrog) = try_leapfrog(patterns, stats, dict, weights) {
        if leapfrog.cost().total < best.cost().total {
            best = leapfrog;
        }
    }
    Ok(best)
}

fn scan_plan(
    pattern: &TriplePattern,
    bound: &HashSet<Variable>,
    stats: &Statistics,
    dict: &dyn Dictionary,
    weights: &CostWeights,
) -> Plan {
    let cardinality = estimate_pattern_with_bindings(pattern, bound, stats, dict);
    let bound_positions = [&pattern.subject, &pattern.predicate, &pattern.object]
        .iter()
        .filter(|slot| is_effectively_bound(slot, bound))
        .count();
    let needs_post_filter = is_effectively_bound(&pattern.subject, bound)
        && !is_effectively_bound(&pattern.predicate, bound)
        && is_effectively_bound(&pattern.object, bound);
    let kind = ScanKind::from_bound_positions(bound_positions);
    let total = stats.total_triples.max(1) as f64;
    let cost = pattern_scan_cost(kind, cardinality, total, needs_post_filter, weights);
    Plan::Scan {
        pattern: pattern.clone(),
        cardinality,
        cost,
    }
}

fn is_effectively_bound(slot: &TermOrVariable, bound: &HashSet<Variable>) -> bool {
    match slot {
        TermOrVariable::Term(_) => true,
        TermOrVariable::Variable(v) => bound.contains(v),
    }
}

/// Joins two already-built plans, choosing between nested-loop and hash
/// join (in both build/probe orderings) by total cost, preferring
/// nested-loop when both inputs are small (< 100 tuples) and it wins.
fn join_plans(left: Plan, right: Plan, stats: &Statistics, weights: &CostWeights) -> Plan {
    let left_card = left.cardinality();
    let right_card = right.cardinality();

    let left_vars: HashSet<Variable> = left.patterns().iter().flat_map(|p| p.variables().into_iter().cloned()).collect();
    let right_vars: HashSet<Variable> = right.patterns().iter().flat_map(|p| p.variables().into_iter().cloned()).collect();
    let join_vars: Vec<Variable> = left_vars.intersection(&right_vars).cloned().collect();
    let children_cost = left.cost().combine(right.cost());

    let joined_card = estimate_join(left_card, right_card, &join_vars, stats);

    let nl_cost = nested_loop_join_cost(left_card, right_card, weights);
    let hash_build_right = hash_join_cost(right_card, left_card, weights);
    let hash_build_left = hash_join_cost(left_card, right_card, weights);
    let (hash_cost, build_left) = if hash_build_left.total <= hash_build_right.total {
        (hash_build_left, true)
    } else {
        (hash_build_right, false)
    };

    let small_inputs = left_card < 100.0 && right_card < 100.0;
    let (strategy, cost) = if small_inputs && nl_cost.total <= hash_cost.total {
        (JoinStrategy::NestedLoop, nl_cost)
    } else if nl_cost.total <= hash_cost.total {
        (JoinStrategy::NestedLoop, nl_cost)
    } else {
        (JoinStrategy::Hash { build_left }, hash_cost)
    };

    Plan::Join {
        strategy,
        left: Box::new(left),
        right: Box::new(right),
        join_vars,
        cardinality: joined_card,
        cost: cost.combine(children_cost),
    }
}

/// Exhaustive left-deep enumeration for `n <= EXHAUSTIVE_JOIN_ENUMERATION_LIMIT`.
/// Every permutation of pattern order is tried; permutations that
/// introduce a Cartesian edge (no shared variable with the accumulated
/// set) are only used if no connected permutation exists at all.
fn exhaustive_enumerate(
    patterns: &[TriplePattern],
    stats: &Statistics,
    dict: &dyn Dictionary,
    weights: &CostWeights,
) -> Result<Plan, PlanError> {
    let indices: Vec<usize> = (0..patterns.len()).collect();
    let mut best_connected: Option<Plan> = None;
    let mut best_any: Option<Plan> = None;

    for perm in indices.into_iter().permutations(patterns.len()) {
        let mut bound: HashSet<Variable> = HashSet::new();
        let first = &patterns[perm[0]];
        let mut plan = scan_plan(first, &bound, stats, dict, weights);
        for v in first.variables() {
            bound.insert(v.clone());
        }
        let mut is_connected = true;

        for &idx in &perm[1..] {
            let next_pattern = &patterns[idx];
            let shares_a_variable = next_pattern.variables().iter().any(|v| bound.contains(*v));
            if !shares_a_variable {
                is_connected = false;
            }
            let right = scan_plan(next_pattern, &bound, stats, dict, weights);
            plan = join_plans(plan, right, stats, weights);
            for v in next_pattern.variables() {
                bound.insert(v.clone());
            }
        }

        let better = |existing: &Option<Plan>| {
            existing.as_ref().map_or(true, |p| plan.cost().total < p.cost().total)
        };
        if is_connected && better(&best_connected) {
            best_connected = Some(plan.clone());
        }
        if better(&best_any) {
            best_any = Some(plan);
        }
    }

    best_connected.or(best_any).ok_or(PlanError::NoValidPlan)
}

/// DP-ccp join enumeration for `n > EXHAUSTIVE_JOIN_ENUMERATION_LIMIT`
/// patterns. Patterns are indexed `0..n` and subsets are represented as
/// bitmasks, so this assumes `n <= 64` - comfortably above any realistic
/// single BGP.
fn dp_ccp(
    patterns: &[TriplePattern],
    stats: &Statistics,
    dict: &dyn Dictionary,
    weights: &CostWeights,
) -> Result<Plan, PlanError> {
    let n = patterns.len();
    assert!(n <= 64, "DP-ccp bitmask enumeration supports at most 64 patterns");

    let pattern_vars: Vec<HashSet<Variable>> = patterns
        .iter()
        .map(|p| p.variables().into_iter().cloned().collect())
        .collect();
    let has_edge = |a: u64, b: u64| -> bool {
        for i in 0..n {
            if a & (1 << i) == 0 {
                continue;
            }
            for j in 0..n {
                if b & (1 << j) == 0 {
                    continue;
                }
                if !pattern_vars[i].is_disjoint(&pattern_vars[j]) {
                    return true;
                }
            }
        }
        false
    };

    let mut memo: std::collections::HashMap<u64, Plan> = std::collections::HashMap::new();
    for i in 0..n {
        memo.insert(1 << i, scan_plan(&patterns[i], &HashSet::new(), stats, dict, weights));
    }

    for size in 2..=n {
        for subset in (0u64..(1u64 << n)).filter(|s| s.count_ones() as usize == size) {
            let mut best: Option<Plan> = None;
            // Enumerate every way to split `subset` into two non-empty,
            // disjoint, edge-connected halves with min(left) < min(right)
            // to avoid counting each pair twice.
            let mut sub = subset;
            loop {
                if sub != 0 && sub != subset {
                    let left = sub;
                    let right = subset & !sub;
                    if left != 0
                        && right != 0
                        && left.trailing_zeros() < right.trailing_zeros()
                        && has_edge(left, right)
                    {
                        if let (Some(left_plan), Some(right_plan)) = (memo.get(&left), memo.get(&right)) {
                            let candidate = join_plans(left_plan.clone(), right_plan.clone(), stats, weights);
                            if best.as_ref().map_or(true, |b| candidate.cost().total < b.cost().total) {
                                best = Some(candidate);
                            }
                        }
                    }
                }
                if sub == 0 {
                    break;
                }
                sub = (sub.wrapping_sub(1)) & subset;
            }
            if let Some(plan) = best {
                memo.insert(subset, plan);
            }
        }
    }

    let full = (1u64 << n) - 1;
    memo.remove(&full).ok_or(PlanError::NoValidPlan)
}

/// Leapfrog is only considered when at least 3 patterns share enough
/// structure to be worth a multi-way merge join: `patterns.len() >= 3`
/// and some variable occurs in at least 3 of them.
fn try_leapfrog(
    patterns: &[TriplePattern],
    stats: &Statistics,
    dict: &dyn Dictionary,
    weights: &CostWeights,
) -> Option<Plan> {
    if patterns.len() < 3 {
        return None;
    }
    let mut occurrence_count: std::collections::HashMap<Variable, usize> = std::collections::HashMap::new();
    for pattern in patterns {
        for v in pattern.variables() {
            *occurrence_count.entry(v.clone()).or_insert(0) += 1;
        }
    }
    let shared_vars: Vec<Variable> = occurrence_count
        .iter()
        .filter(|(_, count)| **count >= 3)
        .map(|(v, _)| v.clone())
        .collect();
    if shared_vars.is_empty() {
        return None;
    }

    let per_pattern_card: Vec<f64> = patterns
        .iter()
        .map(|p| estimate_pattern_with_bindings(p, &HashSet::new(), stats, dict))
        .collect();
    let total = stats.total_triples.max(1) as f64;
    let output_cardinality = estimate_multi_pattern_cardinality(patterns, stats, dict);
    let cost = leapfrog_cost(output_cardinality, patterns.len(), &per_pattern_card, total, weights);

    Some(Plan::Leapfrog {
        patterns: patterns.to_vec(),
        vars: shared_vars,
        cardinality: output_cardinality,
        cost,
    })
}

fn estimate_multi_pattern_cardinality(
    patterns: &[TriplePattern],
    stats: &Statistics,
    dict: &dyn Dictionary,
) -> f64 {
    crate::cardinality::estimate_multi_pattern(patterns, stats, dict)
}
