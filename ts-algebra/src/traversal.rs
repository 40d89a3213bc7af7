use crate::{Algebra, AlgebraError};
use ts_common::limits::MAX_DEPTH;

/// The immediate child algebra subtrees of `node`, in evaluation order.
/// Expression children (inside `Filter`/`Extend`/`OrderBy`) are not
/// algebra nodes and are not returned here.
pub fn children(node: &Algebra) -> Vec<&Algebra> {
    match node {
        Algebra::Bgp(_) | Algebra::Values(..) => vec![],
        Algebra::Join(l, r)
        | Algebra::LeftJoin(l, r, _)
        | Algebra::Minus(l, r)
        | Algebra::Union(l, r) => vec![l.as_ref(), r.as_ref()],
        Algebra::Filter(_, inner)
        | Algebra::Extend(inner, _, _)
        | Algebra::Group(inner, _, _)
        | Algebra::Project(inner, _)
        | Algebra::Distinct(inner)
        | Algebra::Reduced(inner)
        | Algebra::OrderBy(inner, _)
        | Algebra::Slice(inner, _, _)
        | Algebra::Service(_, inner, _)
        | Algebra::Graph(_, inner) => vec![inner.as_ref()],
        Algebra::Path(..) => vec![],
    }
}

/// Rebuilds `node` from `new_children`, which must be the same length and
/// order as [`children`] returns for that node's variant.
fn with_children(node: &Algebra, mut new_children: Vec<Algebra>) -> Algebra {
    match node {
        Algebra::Bgp(patterns) => Algebra::Bgp(patterns.clone()),
        Algebra::Values(vars, rows) => Algebra::Values(vars.clone(), rows.clone()),
        Algebra::Join(..) => Algebra::join(new_children.remove(0), new_children.remove(0)),
        Algebra::LeftJoin(_, _, filter) => {
            Algebra::left_join(new_children.remove(0), new_children.remove(0), filter.clone())
        }
        Algebra::Minus(..) => Algebra::minus(new_children.remove(0), new_children.remove(0)),
        Algebra::Union(..) => Algebra::union(new_children.remove(0), new_children.remove(0)),
        Algebra::Filter(expr, _) => Algebra::filter(expr.clone(), new_children.remove(0)),
        Algebra::Extend(_, var, expr) => {
            Algebra::extend(new_children.remove(0), var.clone(), expr.clone())
        }
        Algebra::Group(_, by, aggs) => {
            Algebra::Group(Box::new(new_children.remove(0)), by.clone(), aggs.clone())
        }
        Algebra::Project(_, vars) => Algebra::project(new_children.remove(0), vars.clone()),
        Algebra::Distinct(_) => Algebra::distinct(new_children.remove(0)),
        Algebra::Reduced(_) => Algebra::Reduced(Box::new(new_children.remove(0))),
        Algebra::OrderBy(_, keys) => Algebra::OrderBy(Box::new(new_children.remove(0)), keys.clone()),
        Algebra::Slice(_, offset, limit) => {
            Algebra::Slice(Box::new(new_children.remove(0)), *offset, *limit)
        }
        Algebra::Service(endpoint, _, silent) => {
            Algebra::Service(endpoint.clone(), Box::new(new_children.remove(0)), *silent)
        }
        Algebra::Graph(term, _) => Algebra::Graph(term.clone(), Box::new(new_children.remove(0))),
        Algebra::Path(s, path, o) => Algebra::Path(s.clone(), path.clone(), o.clone()),
    }
}

/// A bottom-up, depth-checked fold: `f` is applied to each node after its
/// children have already folded into `acc`.
pub fn fold<A>(
    node: &Algebra,
    init: A,
    f: &impl Fn(A, &Algebra) -> A,
) -> Result<A, AlgebraError> {
    fold_depth(node, init, f, 0)
}

fn fold_depth<A>(
    node: &Algebra,
    init: A,
    f: &impl Fn(A, &Algebra) -> A,
    depth: usize,
) -> Result<A, AlgebraError> {
    if depth > MAX_DEPTH {
        return Err(AlgebraError::TooDeeplyNested);
    }
    let mut acc = init;
    for child in children(node) {
        acc = fold_depth(child, acc, f, depth + 1)?;
    }
    Ok(f(acc, node))
}

/// A bottom-up tree rewrite: children are mapped first, the node is
/// rebuilt from the mapped children, and then `f` is applied to the
/// rebuilt node. This is the shape every optimizer pass in this workspace
/// uses.
pub fn map(
    node: &Algebra,
    f: &impl Fn(Algebra) -> Algebra,
) -> Result<Algebra, AlgebraError> {
    map_depth(node, f, 0)
}

fn map_depth(
    node: &Algebra,
    f: &impl Fn(Algebra) -> Algebra,
    depth: usize,
) -> Result<Algebra, AlgebraError> {
    if depth > MAX_DEPTH {
        return Err(AlgebraError::TooDeeplyNested);
    }
    let mapped_children = children(node)
        .into_iter()
        .map(|c| map_depth(c, f, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;
    let rebuilt = with_children(node, mapped_children);
    Ok(f(rebuilt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf() -> Algebra {
        Algebra::bgp(vec![])
    }

    #[test]
    fn fold_counts_nodes_postorder() {
        let tree = Algebra::join(leaf(), leaf());
        let count = fold(&tree, 0, &|acc, _| acc + 1).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn map_rebuilds_structurally_equal_tree_with_identity() {
        let tree = Algebra::distinct(Algebra::join(leaf(), leaf()));
        let mapped = map(&tree, &|n| n).unwrap();
        assert_eq!(mapped, tree);
    }

    #[test]
    fn too_deep_tree_fails_validation() {
        let mut tree = leaf();
        for _ in 0..(MAX_DEPTH + 5) {
            tree = Algebra::distinct(tree);
        }
        assert!(matches!(
            fold(&tree, 0, &|acc, _| acc + 1),
            Err(AlgebraError::TooDeeplyNested)
        ));
    }

    #[test]
    fn children_of_bgp_is_empty() {
        let pattern_tree = Algebra::bgp(vec![]);
        assert!(children(&pattern_tree).is_empty());
    }
}
