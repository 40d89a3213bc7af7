use crate::error::OptimizeError;
use ts_algebra::Algebra;
use ts_common::limits::MAX_DEPTH;
use ts_functions::effective_boolean_value;
use ts_model::Binding;

/// Bottom-up constant folding: arithmetic, comparison, logic, `IF`,
/// `COALESCE`, `NOT` and pure function calls whose arguments are all
/// constant are evaluated eagerly against the empty binding. A `Filter`
/// whose expression reduces to a boolean constant is simplified away, and
/// empty-BGP propagation collapses `Join`/`LeftJoin`/`Union` nodes around
/// an empty `Bgp`.
pub fn constant_fold(tree: &Algebra) -> Result<Algebra, OptimizeError> {
    fold_at_depth(tree, 0)
}

fn fold_at_depth(tree: &Algebra, depth: usize) -> Result<Algebra, OptimizeError> {
    if depth > MAX_DEPTH {
        return Err(OptimizeError::TooDeeplyNested);
    }
    let rebuilt = rebuild_children(tree, depth)?;
    Ok(simplify_node(rebuilt))
}

fn rebuild_children(tree: &Algebra, depth: usize) -> Result<Algebra, OptimizeError> {
    let next = depth + 1;
    Ok(match tree {
        Algebra::Bgp(_) | Algebra::Values(..) => tree.clone(),
        Algebra::Join(l, r) => Algebra::Join(
            Box::new(fold_at_depth(l, next)?),
            Box::new(fold_at_depth(r, next)?),
        ),
        Algebra::LeftJoin(l, r, expr) => Algebra::LeftJoin(
            Box::new(fold_at_depth(l, next)?),
            Box::new(fold_at_depth(r, next)?),
            expr.as_ref().map(fold_expr),
        ),
        Algebra::Minus(l, r) => Algebra::Minus(
            Box::new(fold_at_depth(l, next)?),
            Box::new(fold_at_depth(r, next)?),
        ),
        Algebra::Union(l, r) => Algebra::Union(
            Box::new(fold_at_depth(l, next)?),
            Box::new(fold_at_depth(r, next)?),
        ),
        Algebra::Filter(expr, inner) => {
            Algebra::Filter(fold_expr(expr), Box::new(fold_at_depth(inner, next)?))
        }
        Algebra::Extend(inner, var, expr) => {
            Algebra::Extend(Box::new(fold_at_depth(inner, next)?), var.clone(), fold_expr(expr))
        }
        Algebra::Group(inner, keys, aggs) => {
            Algebra::Group(Box::new(fold_at_depth(inner, next)?), keys.clone(), aggs.clone())
        }
        Algebra::Project(inner, vars) => {
            Algebra::Project(Box::new(fold_at_depth(inner, next)?), vars.clone())
        }
        Algebra::Distinct(inner) => Algebra::Distinct(Box::new(fold_at_depth(inner, next)?)),
        Algebra::Reduced(inner) => Algebra::Reduced(Box::new(fold_at_depth(inner, next)?)),
        Algebra::OrderBy(inner, keys) => {
            let folded_keys = keys.iter().map(|(dir, e)| (*dir, fold_expr(e))).collect();
            Algebra::OrderBy(Box::new(fold_at_depth(inner, next)?), folded_keys)
        }
        Algebra::Slice(inner, offset, limit) => {
            Algebra::Slice(Box::new(fold_at_depth(inner, next)?), *offset, *limit)
        }
        Algebra::Service(target, inner, silent) => {
            Algebra::Service(target.clone(), Box::new(fold_at_depth(inner, next)?), *silent)
        }
        Algebra::Graph(target, inner) => {
            Algebra::Graph(target.clone(), Box::new(fold_at_depth(inner, next)?))
        }
        Algebra::Path(..) => tree.clone(),
    })
}

/// Applies the node-local rewrites (filter-to-constant collapse,
/// empty-BGP propagation) once children are already folded.
fn simplify_node(tree: Algebra) -> Algebra {
    match tree {
        Algebra::Filter(expr, inner) => match expr {
            ts_algebra::Expr::Term(ref term) => match effective_boolean_value(term) {
                Ok(true) => *inner,
                Ok(false) => Algebra::Bgp(vec![]),
                Err(_) => Algebra::Filter(expr, inner),
            },
            _ => Algebra::Filter(expr, inner),
        },
        Algebra::Join(l, r) => {
            if is_empty_bgp(&l) || is_empty_bgp(&r) {
                Algebra::Bgp(vec![])
            } else {
                Algebra::Join(l, r)
            }
        }
        Algebra::LeftJoin(l, r, expr) => {
            if is_empty_bgp(&l) {
                Algebra::Bgp(vec![])
            } else {
                Algebra::LeftJoin(l, r, expr)
            }
        }
        Algebra::Union(l, r) => {
            if is_empty_bgp(&l) && is_empty_bgp(&r) {
                Algebra::Bgp(vec![])
            } else if is_empty_bgp(&l) {
                *r
            } else if is_empty_bgp(&r) {
                *l
            } else {
                Algebra::Union(l, r)
            }
        }
        other => other,
    }
}

fn is_empty_bgp(tree: &Algebra) -> bool {
    matches!(tree, Algebra::Bgp(patterns) if patterns.is_empty())
}

/// Folds a scalar expression bottom-up against the empty binding,
/// replacing any constant subexpression with its evaluated value.
/// Subexpressions that fail to evaluate (because they are not actually
/// constant, or because evaluation itself errors) are left unfolded.
pub fn fold_expr(expr: &ts_algebra::Expr) -> ts_algebra::Expr {
    use ts_algebra::Expr;

    let folded_children = |e: &Expr| -> Expr { fold_expr(e) };

    let rebuilt = match expr {
        Expr::Term(_) | Expr::Variable(_) | Expr::Bound(_) | Expr::Exists(_) | Expr::NotExists(_) => {
            return expr.clone();
        }
        Expr::Not(e) => Expr::Not(Box::new(folded_children(e))),
        Expr::And(l, r) => fold_and(folded_children(l), folded_children(r)),
        Expr::Or(l, r) => fold_or(folded_children(l), folded_children(r)),
        Expr::UnaryPlus(e) => Expr::UnaryPlus(Box::new(folded_children(e))),
        Expr::UnaryMinus(e) => Expr::UnaryMinus(Box::new(folded_children(e))),
        Expr::Add(l, r) => Expr::Add(Box::new(folded_children(l)), Box::new(folded_children(r))),
        Expr::Subtract(l, r) => {
            Expr::Subtract(Box::new(folded_children(l)), Box::new(folded_children(r)))
        }
        Expr::Multiply(l, r) => {
            Expr::Multiply(Box::new(folded_children(l)), Box::new(folded_children(r)))
        }
        Expr::Divide(l, r) => {
            Expr::Divide(Box::new(folded_children(l)), Box::new(folded_children(r)))
        }
        Expr::Equal(l, r) => Expr::Equal(Box::new(folded_children(l)), Box::new(folded_children(r))),
        Expr::Less(l, r) => Expr::Less(Box::new(folded_children(l)), Box::new(folded_children(r))),
        Expr::Greater(l, r) => {
            Expr::Greater(Box::new(folded_children(l)), Box::new(folded_children(r)))
        }
        Expr::LessOrEqual(l, r) => {
            Expr::LessOrEqual(Box::new(folded_children(l)), Box::new(folded_children(r)))
        }
        Expr::GreaterOrEqual(l, r) => {
            Expr::GreaterOrEqual(Box::new(folded_children(l)), Box::new(folded_children(r)))
        }
        Expr::In(needle, list) => Expr::In(
            Box::new(folded_children(needle)),
            list.iter().map(folded_children).collect(),
        ),
        Expr::If(c, t, e) => {
            let c = folded_children(c);
            if let Expr::Term(term) = &c {
                match effective_boolean_value(term) {
                    Ok(true) => return folded_children(t),
                    Ok(false) => return folded_children(e),
                    Err(_) => {}
                }
            }
            Expr::If(Box::new(c), Box::new(folded_children(t)), Box::new(folded_children(e)))
        }
        Expr::Coalesce(options) => Expr::Coalesce(options.iter().map(folded_children).collect()),
        Expr::Call(function, args) => {
            Expr::Call(function.clone(), args.iter().map(folded_children).collect())
        }
    };

    // NOT NOT x -> x
    if let Expr::Not(inner) = &rebuilt {
        if let Expr::Not(doubly_inner) = inner.as_ref() {
            return (**doubly_inner).clone();
        }
    }

    try_evaluate_constant(&rebuilt).unwrap_or(rebuilt)
}

fn fold_and(l: ts_algebra::Expr, r: ts_algebra::Expr) -> ts_algebra::Expr {
    use ts_algebra::Expr;
    match (&l, &r) {
        (Expr::Term(t), _) if effective_boolean_value(t) == Ok(false) => l,
        (_, Expr::Term(t)) if effective_boolean_value(t) == Ok(false) => r,
        (Expr::Term(t), _) if effective_boolean_value(t) == Ok(true) => r,
        (_, Expr::Term(t)) if effective_boolean_value(t) == Ok(true) => l,
        _ => Expr::And(Box::new(l), Box::new(r)),
    }
}

fn fold_or(l: ts_algebra::Expr, r: ts_algebra::Expr) -> ts_algebra::Expr {
    use ts_algebra::Expr;
    match (&l, &r) {
        (Expr::Term(t), _) if effective_boolean_value(t) == Ok(true) => l,
        (_, Expr::Term(t)) if effective_boolean_value(t) == Ok(true) => r,
        (Expr::Term(t), _) if effective_boolean_value(t) == Ok(false) => r,
        (_, Expr::Term(t)) if effective_boolean_value(t) == Ok(false) => l,
        _ => Expr::Or(Box::new(l), Box::new(r)),
    }
}

fn try_evaluate_constant(expr: &ts_algebra::Expr) -> Option<ts_algebra::Expr> {
    if !expr.is_constant() || matches!(expr, ts_algebra::Expr::Term(_)) {
        return None;
    }
    let value = ts_functions::evaluate(expr, &Binding::empty(), None).ok()?;
    Some(ts_algebra::Expr::Term(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::xsd;
    use oxrdf::Literal;
    use ts_algebra::Expr;
    use ts_model::Term;

    fn int(v: i64) -> Expr {
        Expr::Term(Term::Literal(Literal::new_typed_literal(v.to_string(), xsd::INTEGER)))
    }

    fn bool_expr(v: bool) -> Expr {
        Expr::Term(Term::Literal(Literal::new_typed_literal(v.to_string(), xsd::BOOLEAN)))
    }

    #[test]
    fn folds_closed_arithmetic_expression() {
        let e = Expr::Add(Box::new(int(2)), Box::new(int(3)));
        let folded = fold_expr(&e);
        assert_eq!(folded, int(5));
    }

    #[test]
    fn false_and_x_folds_to_false() {
        let e = Expr::And(Box::new(bool_expr(false)), Box::new(Expr::Variable(ts_model::Variable::new("x").unwrap())));
        assert_eq!(fold_expr(&e), bool_expr(false));
    }

    #[test]
    fn not_not_x_folds_to_x() {
        let x = Expr::Variable(ts_model::Variable::new("x").unwrap());
        let e = Expr::Not(Box::new(Expr::Not(Box::new(x.clone()))));
        assert_eq!(fold_expr(&e), x);
    }

    #[test]
    fn filter_true_erases_the_filter() {
        let tree = Algebra::Filter(bool_expr(true), Box::new(Algebra::Bgp(vec![])));
        assert_eq!(constant_fold(&tree).unwrap(), Algebra::Bgp(vec![]));
    }

    #[test]
    fn filter_false_replaces_subtree_with_empty_bgp() {
        let inner = Algebra::Bgp(vec![ts_model::TriplePattern::new(
            ts_model::Variable::new("s").unwrap().into(),
            ts_model::Variable::new("p").unwrap().into(),
            ts_model::Variable::new("o").unwrap().into(),
        )]);
        let tree = Algebra::Filter(bool_expr(false), Box::new(inner));
        assert_eq!(constant_fold(&tree).unwrap(), Algebra::Bgp(vec![]));
    }

    #[test]
    fn join_with_empty_bgp_collapses_to_empty_bgp() {
        let pattern = Algebra::Bgp(vec![ts_model::TriplePattern::new(
            ts_model::Variable::new("s").unwrap().into(),
            ts_model::Variable::new("p").unwrap().into(),
            ts_model::Variable::new("o").unwrap().into(),
        )]);
        let tree = Algebra::Join(Box::new(Algebra::Bgp(vec![])), Box::new(pattern));
        assert_eq!(constant_fold(&tree).unwrap(), Algebra::Bgp(vec![]));
    }

    #[test]
    fn union_with_one_empty_side_yields_the_other() {
        let pattern = Algebra::Bgp(vec![ts_model::TriplePattern::new(
            ts_model::Variable::new("s").unwrap().into(),
            ts_model::Variable::new("p").unwrap().into(),
            ts_model::Variable::new("o").unwrap().into(),
        )]);
        let tree = Algebra::Union(Box::new(Algebra::Bgp(vec![])), Box::new(pattern.clone()));
        assert_eq!(constant_fold(&tree).unwrap(), pattern);
    }
}
