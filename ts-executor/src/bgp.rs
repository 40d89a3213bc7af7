use ts_algebra::Algebra;
use ts_dictionary::Dictionary;
use ts_model::{Binding, IdTriple, TermOrVariable, TriplePattern, Variable};
use ts_planner::{JoinStrategy, Plan};
use ts_storage::BoundPattern;

use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::stream::BindingStream;

/// Executes a basic graph pattern starting from `binding`: every variable
/// `binding` already carries is treated as a bound constant when matching
/// each triple pattern, exactly like a constant named in the pattern
/// itself. The patterns are handed to the planner, which picks an order
/// and a join strategy (nested-loop, hash, or a multi-pattern chain for
/// its leapfrog candidate); this module only interprets the resulting
/// [`Plan`] against the store.
pub fn execute_bgp<'ctx>(
    ctx: &'ctx ExecutionContext<'ctx>,
    patterns: &[TriplePattern],
    binding: Binding,
) -> Result<BindingStream<'ctx>, ExecutionError> {
    if patterns.is_empty() {
        let variables: Vec<Variable> = binding.variables().cloned().collect();
        return Ok(BindingStream::new(variables, std::iter::once(binding)));
    }

    let plan = build_plan(ctx, patterns)?;

    let mut variables: Vec<Variable> = binding.variables().cloned().collect();
    for pattern in patterns {
        for v in pattern.variables() {
            if !variables.contains(v) {
                variables.push(v.clone());
            }
        }
    }

    let cancellation = ctx.cancellation.clone();
    let inner = execute_plan(ctx, plan, binding).take_while(move |_| cancellation.check().is_ok());
    Ok(BindingStream::new(variables, inner))
}

/// Consults `ctx.plan_cache` (keyed on the BGP's own algebra tree, same
/// normalization the planner uses for any other cached plan) before
/// falling back to `ts_planner::build_join_plan`. A cache miss plans and
/// stores; a context with no cache attached always plans fresh.
fn build_plan(ctx: &ExecutionContext<'_>, patterns: &[TriplePattern]) -> Result<Plan, ExecutionError> {
    let Some(cache) = ctx.plan_cache else {
        return Ok(ts_planner::build_join_plan(
            patterns,
            ctx.statistics,
            ctx.dictionary,
            &ctx.cost_weights,
        )?);
    };

    let key_tree = Algebra::Bgp(patterns.to_vec());
    if let Some(plan) = cache.get(&key_tree) {
        return Ok(plan);
    }
    let plan = ts_planner::build_join_plan(patterns, ctx.statistics, ctx.dictionary, &ctx.cost_weights)?;
    cache.put(&key_tree, plan.clone());
    Ok(plan)
}

fn execute_plan<'ctx>(
    ctx: &'ctx ExecutionContext<'ctx>,
    plan: Plan,
    binding: Binding,
) -> Box<dyn Iterator<Item = Binding> + 'ctx> {
    match plan {
        Plan::Scan { pattern, .. } => scan_pattern(ctx, pattern, binding),
        Plan::Join {
            strategy,
            left,
            right,
            join_vars,
            ..
        } => match strategy {
            JoinStrategy::NestedLoop => nested_loop(ctx, *left, *right, binding),
            JoinStrategy::Hash { build_left } => {
                hash_join(ctx, *left, *right, join_vars, build_left, binding)
            }
        },
        // No trie-merge primitive exists over `ts_storage`'s plain index
        // scans, so a leapfrog candidate is executed the same way a
        // multi-pattern BGP chain would be: left-to-right, each pattern
        // substituting what the previous one bound. Same result set as a
        // real leapfrog-triejoin, just without its intersection speedup.
        Plan::Leapfrog { patterns, .. } => sequential_scan_chain(ctx, patterns, binding),
    }
}

fn sequential_scan_chain<'ctx>(
    ctx: &'ctx ExecutionContext<'ctx>,
    patterns: Vec<TriplePattern>,
    binding: Binding,
) -> Box<dyn Iterator<Item = Binding> + 'ctx> {
    patterns.into_iter().fold(
        Box::new(std::iter::once(binding)) as Box<dyn Iterator<Item = Binding> + 'ctx>,
        |acc, pattern| Box::new(acc.flat_map(move |b| scan_pattern(ctx, pattern.clone(), b))),
    )
}

fn nested_loop<'ctx>(
    ctx: &'ctx ExecutionContext<'ctx>,
    left: Plan,
    right: Plan,
    binding: Binding,
) -> Box<dyn Iterator<Item = Binding> + 'ctx> {
    Box::new(
        execute_plan(ctx, left, binding)
            .flat_map(move |left_binding| execute_plan(ctx, right.clone(), left_binding)),
    )
}

fn hash_join<'ctx>(
    ctx: &'ctx ExecutionContext<'ctx>,
    left: Plan,
    right: Plan,
    join_vars: Vec<Variable>,
    build_left: bool,
    binding: Binding,
) -> Box<dyn Iterator<Item = Binding> + 'ctx> {
    let (build_plan, probe_plan) = if build_left { (left, right) } else { (right, left) };
    let dict = ctx.dictionary;

    let mut table: rustc_hash::FxHashMap<Vec<u64>, Vec<Binding>> = Default::default();
    for row in execute_plan(ctx, build_plan, binding.clone()) {
        if let Some(key) = join_key(&join_vars, &row, dict) {
            table.entry(key).or_default().push(row);
        }
    }

    Box::new(execute_plan(ctx, probe_plan, binding).flat_map(move |probe_binding| {
        let matches = join_key(&join_vars, &probe_binding, dict)
            .and_then(|key| table.get(&key).cloned())
            .unwrap_or_default();
        matches.into_iter().filter_map(move |build_binding| {
            if build_binding.is_compatible(&probe_binding) {
                Some(build_binding.merge(&probe_binding))
            } else {
                None
            }
        })
    }))
}

fn join_key(vars: &[Variable], binding: &Binding, dict: &dyn Dictionary) -> Option<Vec<u64>> {
    vars.iter()
        .map(|v| binding.get(v).and_then(|t| dict.resolve(t)))
        .collect()
}

fn scan_pattern<'ctx>(
    ctx: &'ctx ExecutionContext<'ctx>,
    pattern: TriplePattern,
    binding: Binding,
) -> Box<dyn Iterator<Item = Binding> + 'ctx> {
    let Some(bound) = bound_pattern_for(&pattern, &binding, ctx.dictionary) else {
        return Box::new(std::iter::empty());
    };
    let matches: Vec<IdTriple> = ctx.snapshot.scan(bound).collect();
    let dict = ctx.dictionary;
    Box::new(
        matches
            .into_iter()
            .filter_map(move |triple| extend_binding(&pattern, &binding, triple, dict)),
    )
}

/// `None` means a constant position failed to encode (the term has never
/// been seen by the dictionary), so the whole pattern matches nothing.
fn bound_pattern_for(
    pattern: &TriplePattern,
    binding: &Binding,
    dict: &dyn Dictionary,
) -> Option<BoundPattern> {
    Some(BoundPattern::new(
        resolve_position(&pattern.subject, binding, dict)?,
        resolve_position(&pattern.predicate, binding, dict)?,
        resolve_position(&pattern.object, binding, dict)?,
    ))
}

fn resolve_position(
    position: &TermOrVariable,
    binding: &Binding,
    dict: &dyn Dictionary,
) -> Option<Option<u64>> {
    match position {
        TermOrVariable::Term(term) => dict.resolve(term).map(Some),
        TermOrVariable::Variable(v) => match binding.get(v) {
            Some(term) => dict.resolve(term).map(Some),
            None => Some(None),
        },
    }
}

/// Extends `binding` with whatever `pattern`'s variables bind to in
/// `triple`. A variable that repeats within the pattern (or that was
/// already bound coming in) must agree on every occurrence; a mismatch
/// rejects the candidate triple entirely.
fn extend_binding(
    pattern: &TriplePattern,
    binding: &Binding,
    triple: IdTriple,
    dict: &dyn Dictionary,
) -> Option<Binding> {
    let mut result = binding.clone();
    let positions = [
        (&pattern.subject, triple.subject),
        (&pattern.predicate, triple.predicate),
        (&pattern.object, triple.object),
    ];
    for (position, id) in positions {
        if let TermOrVariable::Variable(v) = position {
            match result.get(v) {
                Some(existing) => {
                    if dict.resolve(existing) != Some(id) {
                        return None;
                    }
                }
                None => {
                    let term = dict.decode(id)?;
                    result.insert(v.clone(), term);
                }
            }
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;
    use ts_common::Statistics;
    use ts_dictionary::MemoryDictionary;
    use ts_model::Term;
    use ts_storage::{MemoryTripleStore, TripleStore};

    fn var(name: &str) -> TermOrVariable {
        TermOrVariable::Variable(Variable::new(name).unwrap())
    }

    fn iri(s: &str) -> Term {
        Term::NamedNode(NamedNode::new(s).unwrap())
    }

    fn iri_slot(s: &str) -> TermOrVariable {
        TermOrVariable::Term(iri(s))
    }

    #[test]
    fn single_pattern_scan_binds_all_three_variables() {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let sid = dict.resolve_or_create(&iri("http://ex/alice"));
        let pid = dict.resolve_or_create(&iri("http://ex/knows"));
        let oid = dict.resolve_or_create(&iri("http://ex/bob"));
        store.insert_batch(&[IdTriple::new(sid, pid, oid)]).unwrap();

        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let pattern = TriplePattern::new(var("s"), var("p"), var("o"));
        let result = execute_bgp(&ctx, &[pattern], Binding::empty()).unwrap();
        let out: Vec<Binding> = result.collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get(&Variable::new("s").unwrap()), Some(&iri("http://ex/alice")));
    }

    #[test]
    fn repeated_variable_within_pattern_requires_equal_ids() {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let a = dict.resolve_or_create(&iri("http://ex/a"));
        let p = dict.resolve_or_create(&iri("http://ex/p"));
        let b = dict.resolve_or_create(&iri("http://ex/b"));
        store.insert_batch(&[IdTriple::new(a, p, a), IdTriple::new(a, p, b)]).unwrap();

        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let pattern = TriplePattern::new(var("x"), iri_slot("http://ex/p"), var("x"));
        let result = execute_bgp(&ctx, &[pattern], Binding::empty()).unwrap();
        let out: Vec<Binding> = result.collect();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn two_pattern_join_shares_the_common_variable() {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let alice = dict.resolve_or_create(&iri("http://ex/alice"));
        let knows = dict.resolve_or_create(&iri("http://ex/knows"));
        let bob = dict.resolve_or_create(&iri("http://ex/bob"));
        let name = dict.resolve_or_create(&iri("http://ex/name"));
        let bob_name = dict.resolve_or_create(&iri("http://ex/bobs-name"));
        store
            .insert_batch(&[
                IdTriple::new(alice, knows, bob),
                IdTriple::new(bob, name, bob_name),
            ])
            .unwrap();

        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let p1 = TriplePattern::new(iri_slot("http://ex/alice"), iri_slot("http://ex/knows"), var("friend"));
        let p2 = TriplePattern::new(var("friend"), iri_slot("http://ex/name"), var("friend_name"));
        let result = execute_bgp(&ctx, &[p1, p2], Binding::empty()).unwrap();
        let out: Vec<Binding> = result.collect();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].get(&Variable::new("friend_name").unwrap()),
            Some(&iri("http://ex/bobs-name"))
        );
    }

    #[test]
    fn unknown_constant_matches_nothing() {
        let dict = MemoryDictionary::default();
        let store = MemoryTripleStore::new();
        let snapshot = store.snapshot();
        let stats = Statistics::default();
        let ctx = ExecutionContext::new(&snapshot, &dict, &stats);

        let pattern = TriplePattern::new(iri_slot("http://ex/never-seen"), var("p"), var("o"));
        let result = execute_bgp(&ctx, &[pattern], Binding::empty()).unwrap();
        assert_eq!(result.count(), 0);
    }
}
