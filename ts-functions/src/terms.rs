use crate::numeric::is_numeric;
use oxrdf::{BlankNode, Literal, NamedNode};
use ts_common::{ThinError, ThinResult};
use ts_model::Term;

/// `STR(term)`: the lexical form of a literal, or the IRI string of an
/// IRI. Blank nodes have no lexical form.
pub fn str(term: &Term) -> ThinResult<Term> {
    let s = match term {
        Term::NamedNode(n) => n.as_str().to_owned(),
        Term::Literal(lit) => lit.value().to_owned(),
        Term::BlankNode(_) => return ThinError::expected(),
    };
    Ok(Term::Literal(Literal::new_simple_literal(s)))
}

/// `LANG(term)`: the language tag, or the empty string if there is none.
pub fn lang(term: &Term) -> ThinResult<Term> {
    match term {
        Term::Literal(lit) => Ok(Term::Literal(Literal::new_simple_literal(
            lit.language().unwrap_or("").to_owned(),
        ))),
        _ => ThinError::expected(),
    }
}

/// `DATATYPE(term)`: a literal's datatype IRI. Language-tagged literals
/// report `rdf:langString`.
pub fn datatype(term: &Term) -> ThinResult<Term> {
    match term {
        Term::Literal(lit) => Ok(Term::NamedNode(lit.datatype().into_owned())),
        _ => ThinError::expected(),
    }
}

pub fn iri(term: &Term, base_iri: Option<&str>) -> ThinResult<Term> {
    match term {
        Term::NamedNode(n) => Ok(Term::NamedNode(n.clone())),
        Term::Literal(lit) => {
            let resolved = match base_iri {
                Some(base) => oxiri::Iri::parse(base.to_owned())
                    .ok()
                    .and_then(|base| base.resolve(lit.value()).ok())
                    .map(|iri| iri.into_inner())
                    .unwrap_or_else(|| lit.value().to_owned()),
                None => lit.value().to_owned(),
            };
            NamedNode::new(resolved)
                .map(Term::NamedNode)
                .map_err(|_| ThinError::Expected)
        }
        _ => ThinError::expected(),
    }
}

/// `BNODE()`: a fresh blank node, distinct on every call.
pub fn bnode_fresh() -> Term {
    Term::BlankNode(BlankNode::new(uuid::Uuid::new_v4().simple().to_string()).unwrap())
}

/// `BNODE(seed)`: a blank node whose identity is stable within a query
/// for a given `seed` lexical form.
pub fn bnode_from_seed(seed: &Term) -> ThinResult<Term> {
    match seed {
        Term::Literal(lit) => Ok(Term::BlankNode(
            BlankNode::new(format!("seed-{}", lit.value())).map_err(|_| ThinError::Expected)?,
        )),
        _ => ThinError::expected(),
    }
}

pub fn is_iri(term: &Term) -> bool {
    matches!(term, Term::NamedNode(_))
}

pub fn is_blank(term: &Term) -> bool {
    matches!(term, Term::BlankNode(_))
}

pub fn is_literal(term: &Term) -> bool {
    matches!(term, Term::Literal(_))
}

pub fn is_numeric_term(term: &Term) -> bool {
    is_numeric(term)
}

pub fn str_dt(lexical: &Term, datatype: &Term) -> ThinResult<Term> {
    match (lexical, datatype) {
        (Term::Literal(lex), Term::NamedNode(dt)) if lex.language().is_none() => Ok(Term::Literal(
            Literal::new_typed_literal(lex.value(), dt.clone()),
        )),
        _ => ThinError::expected(),
    }
}

pub fn str_lang(lexical: &Term, lang_tag: &Term) -> ThinResult<Term> {
    match (lexical, lang_tag) {
        (Term::Literal(lex), Term::Literal(tag)) if lex.language().is_none() && tag.language().is_none() => {
            Literal::new_language_tagged_literal(lex.value(), tag.value())
                .map(Term::Literal)
                .map_err(|_| ThinError::Expected)
        }
        _ => ThinError::expected(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::xsd;

    fn iri_term(s: &str) -> Term {
        Term::NamedNode(NamedNode::new(s).unwrap())
    }

    #[test]
    fn str_of_iri_is_its_string() {
        let t = iri_term("http://example.com/");
        assert_eq!(str(&t).unwrap(), Term::Literal(Literal::new_simple_literal("http://example.com/")));
    }

    #[test]
    fn str_of_blank_node_is_error() {
        let t = Term::BlankNode(BlankNode::new("b").unwrap());
        assert!(str(&t).is_err());
    }

    #[test]
    fn is_iri_and_is_blank_are_mutually_exclusive() {
        let t = iri_term("http://example.com/");
        assert!(is_iri(&t));
        assert!(!is_blank(&t));
    }

    #[test]
    fn str_dt_builds_typed_literal() {
        let lex = Term::Literal(Literal::new_simple_literal("42"));
        let dt = iri_term("http://www.w3.org/2001/XMLSchema#integer");
        let result = str_dt(&lex, &dt).unwrap();
        match result {
            Term::Literal(lit) => assert_eq!(lit.datatype(), xsd::INTEGER),
            _ => panic!("expected literal"),
        }
    }

    #[test]
    fn bnode_fresh_calls_are_distinct() {
        assert_ne!(bnode_fresh(), bnode_fresh());
    }
}
