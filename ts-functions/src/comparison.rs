use crate::numeric::NumericValue;
use std::cmp::Ordering;
use ts_common::{ThinError, ThinResult};
use ts_model::Term;

/// SPARQL `=`: numeric comparison when both sides are numeric, RDF term
/// equality otherwise. IRIs and blank nodes only compare equal by
/// identity, never by numeric or lexical coercion.
pub fn equal(a: &Term, b: &Term) -> ThinResult<bool> {
    if let (Some(a), Some(b)) = (as_numeric(a), as_numeric(b)) {
        return Ok(numeric_cmp(a, b) == Ordering::Equal);
    }
    Ok(ts_model::terms_equal(a, b))
}

pub fn same_term(a: &Term, b: &Term) -> bool {
    a == b
}

/// Ordering comparison (`<, >, <=, >=`): numeric when both sides are
/// numeric, lexicographic on the literal value otherwise. IRIs and blank
/// nodes have no ordering comparison.
fn compare(a: &Term, b: &Term) -> ThinResult<Ordering> {
    if let (Some(a), Some(b)) = (as_numeric(a), as_numeric(b)) {
        return Ok(numeric_cmp(a, b));
    }
    match (a, b) {
        (Term::Literal(a), Term::Literal(b)) => Ok(a.value().cmp(b.value())),
        _ => Err(ThinError::Expected),
    }
}

pub fn less(a: &Term, b: &Term) -> ThinResult<bool> {
    compare(a, b).map(|o| o == Ordering::Less)
}

pub fn greater(a: &Term, b: &Term) -> ThinResult<bool> {
    compare(a, b).map(|o| o == Ordering::Greater)
}

pub fn less_or_equal(a: &Term, b: &Term) -> ThinResult<bool> {
    compare(a, b).map(|o| o != Ordering::Greater)
}

pub fn greater_or_equal(a: &Term, b: &Term) -> ThinResult<bool> {
    compare(a, b).map(|o| o != Ordering::Less)
}

fn as_numeric(term: &Term) -> Option<NumericValue> {
    match term {
        Term::Literal(lit) => NumericValue::parse(lit),
        _ => None,
    }
}

fn numeric_cmp(a: NumericValue, b: NumericValue) -> Ordering {
    a.to_f64().partial_cmp(&b.to_f64()).unwrap_or(Ordering::Equal)
}

/// The canonical term ordering used by `ORDER BY`, `MIN`, and `MAX`:
/// blank nodes before IRIs before simple literals before language-tagged
/// literals before typed literals, lexicographic within each tier.
pub fn canonical_order(a: &Term, b: &Term) -> Ordering {
    tier(a).cmp(&tier(b)).then_with(|| lexical_cmp(a, b))
}

fn tier(term: &Term) -> u8 {
    match term {
        Term::BlankNode(_) => 0,
        Term::NamedNode(_) => 1,
        Term::Literal(lit) => {
            if lit.is_plain_or_string() {
                2
            } else if lit.language().is_some() {
                3
            } else {
                4
            }
        }
    }
}

fn lexical_cmp(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::BlankNode(a), Term::BlankNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::NamedNode(a), Term::NamedNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::Literal(a), Term::Literal(b)) => a.value().cmp(b.value()),
        _ => Ordering::Equal,
    }
}

trait PlainOrString {
    fn is_plain_or_string(&self) -> bool;
}

impl PlainOrString for oxrdf::Literal {
    fn is_plain_or_string(&self) -> bool {
        self.language().is_none() && self.datatype() == oxrdf::vocab::xsd::STRING
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::xsd;
    use oxrdf::{BlankNode, Literal, NamedNode};

    fn int(v: i64) -> Term {
        Term::Literal(Literal::new_typed_literal(v.to_string(), xsd::INTEGER))
    }

    #[test]
    fn numeric_equality_ignores_datatype_rank() {
        let a = int(1);
        let b = Term::Literal(Literal::new_typed_literal("1.0", xsd::DECIMAL));
        assert_eq!(equal(&a, &b), Ok(true));
    }

    #[test]
    fn iri_does_not_equal_string_with_same_lexical_form() {
        let iri = Term::NamedNode(NamedNode::new("http://example.com/x").unwrap());
        let s = Term::Literal(Literal::new_simple_literal("http://example.com/x"));
        assert!(!ts_model::terms_equal(&iri, &s));
    }

    #[test]
    fn canonical_order_places_blank_before_iri_before_literal() {
        let blank = Term::BlankNode(BlankNode::new("b").unwrap());
        let iri = Term::NamedNode(NamedNode::new("http://example.com/").unwrap());
        let lit = Term::Literal(Literal::new_simple_literal("x"));
        assert_eq!(canonical_order(&blank, &iri), Ordering::Less);
        assert_eq!(canonical_order(&iri, &lit), Ordering::Less);
    }

    #[test]
    fn less_than_compares_numerically() {
        assert_eq!(less(&int(1), &int(2)), Ok(true));
    }
}
