use crate::comparison::canonical_order;
use crate::decimal::Decimal;
use crate::numeric::NumericValue;
use oxrdf::vocab::xsd;
use oxrdf::Literal;
use ts_algebra::AggregateExpr;
use ts_common::{ThinError, ThinResult};
use ts_model::{Binding, Term};

/// Evaluates an aggregate over a solution group. `eval` projects the
/// aggregate's inner expression against one binding at a time; this
/// function owns only the fold, not scalar expression evaluation.
pub fn evaluate_aggregate(
    agg: &AggregateExpr,
    group: &[Binding],
    eval: impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
) -> ThinResult<Term> {
    match agg {
        AggregateExpr::Count { expr, distinct } => count(expr.as_deref(), group, *distinct, &eval),
        AggregateExpr::Sum { expr, distinct } => sum(expr, group, *distinct, &eval),
        AggregateExpr::Avg { expr, distinct } => avg(expr, group, *distinct, &eval),
        AggregateExpr::Min { expr } => min_or_max(expr, group, &eval, false),
        AggregateExpr::Max { expr } => min_or_max(expr, group, &eval, true),
        AggregateExpr::GroupConcat {
            expr,
            distinct,
            separator,
        } => group_concat(expr, group, *distinct, separator.as_deref(), &eval),
        AggregateExpr::Sample { expr } => sample(expr, group, &eval),
    }
}

fn int_term(value: i64) -> Term {
    Term::Literal(Literal::new_typed_literal(value.to_string(), xsd::INTEGER))
}

fn dedup_by_lexical(values: Vec<Term>) -> Vec<Term> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|t| seen.insert(format!("{t:?}")))
        .collect()
}

fn count(
    expr: Option<&ts_algebra::Expr>,
    group: &[Binding],
    distinct: bool,
    eval: &impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
) -> ThinResult<Term> {
    let count = match expr {
        None => group.len(),
        Some(expr) => {
            let values: Vec<Term> = group.iter().filter_map(|b| eval(expr, b).ok()).collect();
            if distinct {
                dedup_by_lexical(values).len()
            } else {
                values.len()
            }
        }
    };
    Ok(int_term(count as i64))
}

fn numeric_values(
    expr: &ts_algebra::Expr,
    group: &[Binding],
    distinct: bool,
    eval: &impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
) -> Vec<NumericValue> {
    let terms: Vec<Term> = group
        .iter()
        .filter_map(|b| eval(expr, b).ok())
        .filter(|t| matches!(t, Term::Literal(lit) if NumericValue::parse(lit).is_some()))
        .collect();
    let terms = if distinct { dedup_by_lexical(terms) } else { terms };
    terms
        .into_iter()
        .filter_map(|t| match t {
            Term::Literal(lit) => NumericValue::parse(&lit),
            _ => None,
        })
        .collect()
}

fn sum(
    expr: &ts_algebra::Expr,
    group: &[Binding],
    distinct: bool,
    eval: &impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
) -> ThinResult<Term> {
    let values = numeric_values(expr, group, distinct, eval);
    let mut acc = Decimal::ZERO;
    for v in &values {
        acc = acc
            .checked_add(v.to_decimal().unwrap_or(Decimal::ZERO))
            .ok_or(ThinError::Expected)?;
    }
    Ok(NumericValue::Decimal(acc).to_term())
}

fn avg(
    expr: &ts_algebra::Expr,
    group: &[Binding],
    distinct: bool,
    eval: &impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
) -> ThinResult<Term> {
    let values = numeric_values(expr, group, distinct, eval);
    if values.is_empty() {
        return Ok(NumericValue::Decimal(Decimal::ZERO).to_term());
    }
    let mut acc = Decimal::ZERO;
    for v in &values {
        acc = acc
            .checked_add(v.to_decimal().unwrap_or(Decimal::ZERO))
            .ok_or(ThinError::Expected)?;
    }
    let count = Decimal::from_i64(values.len() as i64);
    let avg = acc.checked_div(count).ok_or(ThinError::Expected)?;
    Ok(NumericValue::Decimal(avg).to_term())
}

fn min_or_max(
    expr: &ts_algebra::Expr,
    group: &[Binding],
    eval: &impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
    want_max: bool,
) -> ThinResult<Term> {
    let values: Vec<Term> = group.iter().filter_map(|b| eval(expr, b).ok()).collect();
    values
        .into_iter()
        .reduce(|a, b| {
            let ord = canonical_order(&a, &b);
            let b_wins = if want_max {
                ord == std::cmp::Ordering::Less
            } else {
                ord == std::cmp::Ordering::Greater
            };
            if b_wins {
                b
            } else {
                a
            }
        })
        .ok_or(ThinError::Expected)
}

fn group_concat(
    expr: &ts_algebra::Expr,
    group: &[Binding],
    distinct: bool,
    separator: Option<&str>,
    eval: &impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
) -> ThinResult<Term> {
    let values: Vec<Term> = group.iter().filter_map(|b| eval(expr, b).ok()).collect();
    let values = if distinct { dedup_by_lexical(values) } else { values };
    let sep = separator.unwrap_or(" ");
    let joined = values
        .iter()
        .map(|t| match t {
            Term::Literal(lit) => lit.value().to_owned(),
            Term::NamedNode(n) => n.as_str().to_owned(),
            Term::BlankNode(b) => b.as_str().to_owned(),
        })
        .collect::<Vec<_>>()
        .join(sep);
    Ok(Term::Literal(Literal::new_simple_literal(joined)))
}

fn sample(
    expr: &ts_algebra::Expr,
    group: &[Binding],
    eval: &impl Fn(&ts_algebra::Expr, &Binding) -> ThinResult<Term>,
) -> ThinResult<Term> {
    group
        .iter()
        .find_map(|b| eval(expr, b).ok())
        .ok_or(ThinError::Expected)
}
