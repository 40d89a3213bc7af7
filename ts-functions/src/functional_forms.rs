use oxrdf::Literal;
use ts_common::ThinResult;
use ts_model::Term;

fn bool_term(value: bool) -> Term {
    Term::Literal(Literal::new_typed_literal(
        value.to_string(),
        oxrdf::vocab::xsd::BOOLEAN,
    ))
}

pub fn not(ebv: bool) -> Term {
    bool_term(!ebv)
}

pub fn and(lhs: ThinResult<bool>, rhs: ThinResult<bool>) -> ThinResult<Term> {
    // Both sides are evaluated regardless of outcome, per the evaluator's
    // "no short-circuit required at the language level" contract -
    // callers already did that before calling in; here we just combine
    // the two effective boolean values, with SPARQL's three-valued logic:
    // `false && error = false`, `error && false = false`, anything else
    // with an error propagates the error.
    match (lhs, rhs) {
        (Ok(false), _) | (_, Ok(false)) => Ok(bool_term(false)),
        (Ok(a), Ok(b)) => Ok(bool_term(a && b)),
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

pub fn or(lhs: ThinResult<bool>, rhs: ThinResult<bool>) -> ThinResult<Term> {
    match (lhs, rhs) {
        (Ok(true), _) | (_, Ok(true)) => Ok(bool_term(true)),
        (Ok(a), Ok(b)) => Ok(bool_term(a || b)),
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_short_circuits_on_a_false_operand_even_if_the_other_errors() {
        let result = and(Ok(false), Err(ts_common::ThinError::Expected));
        assert_eq!(result, Ok(bool_term(false)));
    }

    #[test]
    fn or_short_circuits_on_a_true_operand_even_if_the_other_errors() {
        let result = or(Ok(true), Err(ts_common::ThinError::Expected));
        assert_eq!(result, Ok(bool_term(true)));
    }

    #[test]
    fn and_of_two_errors_is_an_error() {
        let result = and(
            Err(ts_common::ThinError::Expected),
            Err(ts_common::ThinError::Expected),
        );
        assert!(result.is_err());
    }
}
