use crate::plan::Plan;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::Mutex;
use ts_algebra::{Algebra, Expr};
use ts_common::limits::DEFAULT_PLAN_CACHE_SIZE;
use ts_model::Variable;

/// SHA-256 of a canonical serialization of `tree` in which every variable
/// name is replaced by its first-occurrence index, so two algebra trees
/// that differ only by variable naming hash identically (testable
/// property: plan-cache key normalization under variable renaming).
pub type CacheKey = [u8; 32];

pub fn cache_key(tree: &Algebra) -> CacheKey {
    let mut renamer = FxHashMap::default();
    let mut bytes = Vec::new();
    encode_algebra(tree, &mut renamer, &mut bytes);
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hasher.finalize().into()
}

fn variable_index(var: &Variable, renamer: &mut FxHashMap<Variable, u32>) -> u32 {
    let next = renamer.len() as u32;
    *renamer.entry(var.clone()).or_insert(next)
}

fn encode_algebra(tree: &Algebra, renamer: &mut FxHashMap<Variable, u32>, out: &mut Vec<u8>) {
    match tree {
        Algebra::Bgp(patterns) => {
            out.push(0);
            out.extend((patterns.len() as u32).to_le_bytes());
            for p in patterns {
                for slot in [&p.subject, &p.predicate, &p.object] {
                    encode_term_or_var(slot, renamer, out);
                }
            }
        }
        Algebra::Join(l, r) => {
            out.push(1);
            encode_algebra(l, renamer, out);
            encode_algebra(r, renamer, out);
        }
        Algebra::LeftJoin(l, r, expr) => {
            out.push(2);
            encode_algebra(l, renamer, out);
            encode_algebra(r, renamer, out);
            encode_opt_expr(expr, renamer, out);
        }
        Algebra::Minus(l, r) => {
            out.push(3);
            encode_algebra(l, renamer, out);
            encode_algebra(r, renamer, out);
        }
        Algebra::Union(l, r) => {
            out.push(4);
            encode_algebra(l, renamer, out);
            encode_algebra(r, renamer, out);
        }
        Algebra::Filter(expr, inner) => {
            out.push(5);
            encode_expr(expr, renamer, out);
            encode_algebra(inner, renamer, out);
        }
        Algebra::Extend(inner, var, expr) => {
            out.push(6);
            encode_algebra(inner, renamer, out);
            out.extend(variable_index(var, renamer).to_le_bytes());
            encode_expr(expr, renamer, out);
        }
        Algebra::Group(inner, by, aggs) => {
            out.push(7);
            encode_algebra(inner, renamer, out);
            out.extend((by.len() as u32).to_le_bytes());
            for v in by {
                out.extend(variable_index(v, renamer).to_le_bytes());
            }
            out.extend((aggs.len() as u32).to_le_bytes());
            for (v, agg) in aggs {
                out.extend(variable_index(v, renamer).to_le_bytes());
                out.extend(format!("{agg:?}").as_bytes());
                if let Some(e) = agg.inner_expr() {
                    encode_expr(e, renamer, out);
                }
            }
        }
        Algebra::Project(inner, vars) => {
            out.push(8);
            encode_algebra(inner, renamer, out);
            out.extend((vars.len() as u32).to_le_bytes());
            for v in vars {
                out.extend(variable_index(v, renamer).to_le_bytes());
            }
        }
        Algebra::Distinct(inner) => {
            out.push(9);
            encode_algebra(inner, renamer, out);
        }
        Algebra::Reduced(inner) => {
            out.push(10);
            encode_algebra(inner, renamer, out);
        }
        Algebra::OrderBy(inner, keys) => {
            out.push(11);
            encode_algebra(inner, renamer, out);
            out.extend((keys.len() as u32).to_le_bytes());
            for (dir, e) in keys {
                out.push(if *dir == ts_algebra::OrderDirection::Asc { 0 } else { 1 });
                encode_expr(e, renamer, out);
            }
        }
        Algebra::Slice(inner, offset, limit) => {
            out.push(12);
            encode_algebra(inner, renamer, out);
            out.extend(offset.to_le_bytes());
            out.extend(limit.unwrap_or(u64::MAX).to_le_bytes());
        }
        Algebra::Values(vars, rows) => {
            out.push(13);
            out.extend((vars.len() as u32).to_le_bytes());
            for v in vars {
                out.extend(variable_index(v, renamer).to_le_bytes());
            }
            out.extend((rows.len() as u32).to_le_bytes());
            for row in rows {
                for cell in row {
                    match cell {
                        Some(term) => out.extend(term.to_string().as_bytes()),
                        None => out.push(0xff),
                    }
                    out.push(0);
                }
            }
        }
        Algebra::Service(target, inner, silent) => {
            out.push(14);
            encode_term_or_var(target, renamer, out);
            encode_algebra(inner, renamer, out);
            out.push(*silent as u8);
        }
        Algebra::Graph(target, inner) => {
            out.push(15);
            encode_term_or_var(target, renamer, out);
            encode_algebra(inner, renamer, out);
        }
        Algebra::Path(s, path, o) => {
            out.push(16);
            encode_term_or_var(s, renamer, out);
            out.extend(format!("{path:?}").as_bytes());
            encode_term_or_var(o, renamer, out);
        }
    }
}

fn encode_term_or_var(
    slot: &ts_model::TermOrVariable,
    renamer: &mut FxHashMap<Variable, u32>,
    out: &mut Vec<u8>,
) {
    match slot {
        ts_model::TermOrVariable::Term(t) => {
            out.push(0);
            out.extend(t.to_string().as_bytes());
            out.push(0);
        }
        ts_model::TermOrVariable::Variable(v) => {
            out.push(1);
            out.extend(variable_index(v, renamer).to_le_bytes());
        }
    }
}

fn encode_binary(
    tag: u8,
    l: &Expr,
    r: &Expr,
    renamer: &mut FxHashMap<Variable, u32>,
    out: &mut Vec<u8>,
) {
    out.push(tag);
    encode_expr(l, renamer, out);
    encode_expr(r, renamer, out);
}

fn encode_opt_expr(expr: &Option<Expr>, renamer: &mut FxHashMap<Variable, u32>, out: &mut Vec<u8>) {
    match expr {
        Some(e) => {
            out.push(1);
            encode_expr(e, renamer, out);
        }
        None => out.push(0),
    }
}

/// Encodes an expression by its variant tag and children, substituting
/// every variable with its normalized index and every leaf term with its
/// lexical form. Every variant is matched explicitly (rather than via
/// `Debug`) so that a variable's *name* never leaks into the key - only
/// its normalized index does, which is what makes the key invariant
/// under variable renaming.
fn encode_expr(expr: &Expr, renamer: &mut FxHashMap<Variable, u32>, out: &mut Vec<u8>) {
    match expr {
        Expr::Term(t) => {
            out.push(0);
            out.extend(t.to_string().as_bytes());
        }
        Expr::Variable(v) => {
            out.push(1);
            out.extend(variable_index(v, renamer).to_le_bytes());
        }
        Expr::Bound(v) => {
            out.push(2);
            out.extend(variable_index(v, renamer).to_le_bytes());
        }
        Expr::Exists(a) => {
            out.push(3);
            encode_algebra(a, renamer, out);
        }
        Expr::NotExists(a) => {
            out.push(4);
            encode_algebra(a, renamer, out);
        }
        Expr::Not(e) => {
            out.push(5);
            encode_expr(e, renamer, out);
        }
        Expr::UnaryPlus(e) => {
            out.push(6);
            encode_expr(e, renamer, out);
        }
        Expr::UnaryMinus(e) => {
            out.push(7);
            encode_expr(e, renamer, out);
        }
        Expr::And(l, r) => encode_binary(8, l, r, renamer, out),
        Expr::Or(l, r) => encode_binary(9, l, r, renamer, out),
        Expr::Add(l, r) => encode_binary(10, l, r, renamer, out),
        Expr::Subtract(l, r) => encode_binary(11, l, r, renamer, out),
        Expr::Multiply(l, r) => encode_binary(12, l, r, renamer, out),
        Expr::Divide(l, r) => encode_binary(13, l, r, renamer, out),
        Expr::Equal(l, r) => encode_binary(14, l, r, renamer, out),
        Expr::Less(l, r) => encode_binary(15, l, r, renamer, out),
        Expr::Greater(l, r) => encode_binary(16, l, r, renamer, out),
        Expr::LessOrEqual(l, r) => encode_binary(17, l, r, renamer, out),
        Expr::GreaterOrEqual(l, r) => encode_binary(18, l, r, renamer, out),
        Expr::In(needle, list) => {
            out.push(19);
            encode_expr(needle, renamer, out);
            out.extend((list.len() as u32).to_le_bytes());
            for item in list {
                encode_expr(item, renamer, out);
            }
        }
        Expr::If(c, t, e) => {
            out.push(20);
            encode_expr(c, renamer, out);
            encode_expr(t, renamer, out);
            encode_expr(e, renamer, out);
        }
        Expr::Coalesce(options) => {
            out.push(21);
            out.extend((options.len() as u32).to_le_bytes());
            for item in options {
                encode_expr(item, renamer, out);
            }
        }
        Expr::Call(function, args) => {
            out.push(22);
            out.extend(format!("{function:?}").as_bytes());
            out.push(0);
            out.extend((args.len() as u32).to_le_bytes());
            for item in args {
                encode_expr(item, renamer, out);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

struct Inner {
    entries: FxHashMap<CacheKey, Plan>,
    recency: VecDeque<CacheKey>,
    capacity: usize,
    stats: CacheStats,
}

/// An LRU plan cache keyed on the normalized algebra tree. All operations
/// are linearizable (guarded by a single mutex), matching §5's
/// requirement that the plan cache is shared mutable state with
/// linearizable ops.
pub struct PlanCache {
    inner: Mutex<Inner>,
}

impl PlanCache {
    pub fn new(capacity: usize) -> Self {
        PlanCache {
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                recency: VecDeque::new(),
                capacity: capacity.max(1),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn get(&self, tree: &Algebra) -> Option<Plan> {
        let key = cache_key(tree);
        let mut inner = self.inner.lock().unwrap();
        let found = inner.entries.get(&key).cloned();
        if found.is_some() {
            inner.stats.hits += 1;
            inner.recency.retain(|k| k != &key);
            inner.recency.push_back(key);
        } else {
            inner.stats.misses += 1;
        }
        found
    }

    pub fn put(&self, tree: &Algebra, plan: Plan) {
        let key = cache_key(tree);
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.insert(key, plan).is_none() {
            inner.recency.push_back(key);
            if inner.entries.len() > inner.capacity {
                if let Some(evicted) = inner.recency.pop_front() {
                    inner.entries.remove(&evicted);
                    inner.stats.evictions += 1;
                }
            }
        } else {
            inner.recency.retain(|k| k != &key);
            inner.recency.push_back(key);
        }
        inner.stats.len = inner.entries.len();
    }

    /// Returns the cached plan for `tree`, computing and storing it via
    /// `f` on a miss.
    pub fn get_or_compute(&self, tree: &Algebra, f: impl FnOnce() -> Plan) -> Plan {
        if let Some(plan) = self.get(tree) {
            return plan;
        }
        let plan = f();
        self.put(tree, plan.clone());
        plan
    }

    /// Clears the entire cache. Callers must invoke this after bulk data
    /// loads or schema changes invalidate prior cardinality estimates.
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.recency.clear();
        inner.stats.len = 0;
    }

    pub fn invalidate_key(&self, tree: &Algebra) {
        let key = cache_key(tree);
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.remove(&key).is_some() {
            inner.recency.retain(|k| k != &key);
            inner.stats.len = inner.entries.len();
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap().stats
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        PlanCache::new(DEFAULT_PLAN_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Cost;
    use ts_model::{TermOrVariable, TriplePattern};

    fn bgp(var_names: [&str; 3]) -> Algebra {
        Algebra::bgp(vec![TriplePattern::new(
            TermOrVariable::Variable(Variable::new(var_names[0]).unwrap()),
            TermOrVariable::Variable(Variable::new(var_names[1]).unwrap()),
            TermOrVariable::Variable(Variable::new(var_names[2]).unwrap()),
        )])
    }

    fn dummy_plan(pattern: &Algebra) -> Plan {
        let patterns = match pattern {
            Algebra::Bgp(p) => p.clone(),
            _ => unreachable!(),
        };
        Plan::Scan {
            pattern: patterns[0].clone(),
            cardinality: 1.0,
            cost: Cost::zero(),
        }
    }

    #[test]
    fn renaming_variables_yields_the_same_cache_key() {
        let a = bgp(["s", "p", "o"]);
        let b = bgp(["x", "y", "z"]);
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn different_shapes_yield_different_keys() {
        let a = bgp(["s", "p", "o"]);
        let b = Algebra::distinct(bgp(["s", "p", "o"]));
        assert_ne!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn get_or_compute_caches_across_renamed_variables() {
        let cache = PlanCache::new(10);
        let a = bgp(["s", "p", "o"]);
        let b = bgp(["x", "y", "z"]);
        let plan_a = dummy_plan(&a);
        cache.get_or_compute(&a, || plan_a.clone());
        let stats_before = cache.stats();
        cache.get_or_compute(&b, || dummy_plan(&b));
        let stats_after = cache.stats();
        assert_eq!(stats_after.hits, stats_before.hits + 1);
    }

    #[test]
    fn capacity_overflow_evicts_the_least_recently_used_entry() {
        let cache = PlanCache::new(1);
        let a = bgp(["a", "b", "c"]);
        let b = Algebra::distinct(bgp(["a", "b", "c"]));
        cache.put(&a, dummy_plan(&a));
        cache.put(&b, dummy_plan(&a));
        assert!(cache.get(&a).is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn invalidate_clears_every_entry() {
        let cache = PlanCache::new(10);
        let a = bgp(["a", "b", "c"]);
        cache.put(&a, dummy_plan(&a));
        cache.invalidate();
        assert_eq!(cache.stats().len, 0);
        assert!(cache.get(&a).is_none());
    }
}
