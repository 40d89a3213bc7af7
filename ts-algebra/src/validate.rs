use crate::{Algebra, PropertyPath};
use ts_common::limits::MAX_DEPTH;

/// The structural errors `validate` can report. Each variant names the
/// node kind and the constraint it violates, so a caller can surface a
/// useful parse-time diagnostic without re-walking the tree.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum AlgebraError {
    #[error("algebra tree exceeds MAX_DEPTH ({MAX_DEPTH})")]
    TooDeeplyNested,
    #[error("Slice offset is negative")]
    NegativeSliceOffset,
    #[error("Values rows have inconsistent arity: expected {expected}, found {found}")]
    ValuesArityMismatch { expected: usize, found: usize },
    #[error("Group references aggregate variable {0:?} in its by-list")]
    GroupByReferencesAggregateVariable(String),
    #[error("NegatedPropertySet contains a non-IRI term")]
    NegatedPropertySetNotIri,
    #[error("Project references no variables")]
    EmptyProject,
}

/// Recursively checks structural invariants of an algebra tree. Returns
/// the first violation found in a pre-order walk; an `Ok(())` result does
/// not imply the tree type-checks against a dataset, only that it is
/// well-formed.
pub fn validate(node: &Algebra) -> Result<(), AlgebraError> {
    validate_depth(node, 0)
}

fn validate_depth(node: &Algebra, depth: usize) -> Result<(), AlgebraError> {
    if depth > MAX_DEPTH {
        return Err(AlgebraError::TooDeeplyNested);
    }
    match node {
        Algebra::Slice(inner, offset, _) => {
            if *offset < 0 {
                return Err(AlgebraError::NegativeSliceOffset);
            }
            validate_depth(inner, depth + 1)?;
        }
        Algebra::Values(vars, rows) => {
            for row in rows {
                if row.len() != vars.len() {
                    return Err(AlgebraError::ValuesArityMismatch {
                        expected: vars.len(),
                        found: row.len(),
                    });
                }
            }
        }
        Algebra::Group(inner, by, aggs) => {
            let agg_vars: Vec<_> = aggs.iter().map(|(v, _)| v).collect();
            if let Some(v) = by.iter().find(|v| agg_vars.contains(v)) {
                return Err(AlgebraError::GroupByReferencesAggregateVariable(
                    v.as_str().to_owned(),
                ));
            }
            validate_depth(inner, depth + 1)?;
        }
        Algebra::Project(inner, vars) => {
            if vars.is_empty() {
                return Err(AlgebraError::EmptyProject);
            }
            validate_depth(inner, depth + 1)?;
        }
        Algebra::Path(_, path, _) => validate_path(path)?,
        Algebra::Bgp(_) => {}
        Algebra::Join(l, r)
        | Algebra::LeftJoin(l, r, _)
        | Algebra::Minus(l, r)
        | Algebra::Union(l, r) => {
            validate_depth(l, depth + 1)?;
            validate_depth(r, depth + 1)?;
        }
        Algebra::Filter(_, inner)
        | Algebra::Extend(inner, _, _)
        | Algebra::Distinct(inner)
        | Algebra::Reduced(inner)
        | Algebra::OrderBy(inner, _)
        | Algebra::Service(_, inner, _)
        | Algebra::Graph(_, inner) => validate_depth(inner, depth + 1)?,
    }
    Ok(())
}

fn validate_path(path: &PropertyPath) -> Result<(), AlgebraError> {
    match path {
        PropertyPath::Link(_) => Ok(()),
        PropertyPath::Inverse(p) | PropertyPath::ZeroOrMore(p) | PropertyPath::OneOrMore(p)
        | PropertyPath::ZeroOrOne(p) => validate_path(p),
        PropertyPath::Sequence(l, r) | PropertyPath::Alternative(l, r) => {
            validate_path(l)?;
            validate_path(r)
        }
        PropertyPath::NegatedPropertySet(terms) => {
            if terms.iter().any(|t| !matches!(t, ts_model::Term::NamedNode(_))) {
                return Err(AlgebraError::NegatedPropertySetNotIri);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_model::Variable;

    #[test]
    fn negative_slice_offset_is_rejected() {
        let tree = Algebra::slice(Algebra::empty_bgp(), -1, None);
        assert_eq!(validate(&tree), Err(AlgebraError::NegativeSliceOffset));
    }

    #[test]
    fn nonnegative_slice_offset_is_accepted() {
        let tree = Algebra::slice(Algebra::empty_bgp(), 0, Some(10));
        assert!(validate(&tree).is_ok());
    }

    #[test]
    fn values_with_mismatched_row_arity_is_rejected() {
        let tree = Algebra::Values(vec![Variable::new("x").unwrap()], vec![vec![None, None]]);
        assert!(matches!(
            validate(&tree),
            Err(AlgebraError::ValuesArityMismatch { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn empty_project_is_rejected() {
        let tree = Algebra::project(Algebra::empty_bgp(), vec![]);
        assert_eq!(validate(&tree), Err(AlgebraError::EmptyProject));
    }

    #[test]
    fn too_deep_tree_is_rejected() {
        let mut tree = Algebra::empty_bgp();
        for _ in 0..(MAX_DEPTH + 5) {
            tree = Algebra::distinct(tree);
        }
        assert_eq!(validate(&tree), Err(AlgebraError::TooDeeplyNested));
    }
}
