use crate::numeric::NumericValue;
use oxrdf::vocab::xsd;
use ts_common::ThinResult;
use ts_model::Term;

/// The SPARQL "effective boolean value" coercion used by logical
/// connectives, `FILTER`, and `IF`'s condition.
pub fn effective_boolean_value(term: &Term) -> ThinResult<bool> {
    match term {
        Term::Literal(lit) if lit.datatype() == xsd::BOOLEAN => {
            lit.value().parse::<bool>().map_err(Into::into)
        }
        Term::Literal(lit) if lit.datatype() == xsd::STRING => Ok(!lit.value().is_empty()),
        Term::Literal(lit) => match NumericValue::parse(lit) {
            Some(n) => Ok(!n.is_zero()),
            None => ts_common::ThinError::expected(),
        },
        _ => ts_common::ThinError::expected(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Literal;

    #[test]
    fn empty_string_is_false() {
        let t = Term::Literal(Literal::new_simple_literal(""));
        assert_eq!(effective_boolean_value(&t), Ok(false));
    }

    #[test]
    fn nonempty_string_is_true() {
        let t = Term::Literal(Literal::new_simple_literal("x"));
        assert_eq!(effective_boolean_value(&t), Ok(true));
    }

    #[test]
    fn zero_integer_is_false() {
        let t = Term::Literal(Literal::new_typed_literal("0", xsd::INTEGER));
        assert_eq!(effective_boolean_value(&t), Ok(false));
    }

    #[test]
    fn iri_has_no_effective_boolean_value() {
        let t = Term::NamedNode(oxrdf::NamedNode::new("http://example.com/").unwrap());
        assert!(effective_boolean_value(&t).is_err());
    }
}
