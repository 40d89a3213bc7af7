//! RDF term, variable, triple and binding types.
//!
//! The RDF term type itself is treated as an external, contract-only concern
//! (see the core specification's data model section): we reuse `oxrdf`'s
//! term types rather than inventing our own, and build the query-engine-
//! specific types (variables, triple patterns, solution bindings) on top.

mod binding;
mod pattern;
mod variable;

pub use binding::Binding;
pub use pattern::{TermOrVariable, TriplePattern};
pub use variable::{Variable, VariableParseError};

pub use oxrdf::{BlankNode, BlankNodeRef, Literal, LiteralRef, NamedNode, NamedNodeRef};
pub use oxrdf::{Subject, SubjectRef, Term, TermRef, Triple, TripleRef};

/// A single RDF triple over stored term identifiers, positionally tagged
/// the same way as [`TriplePattern`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdTriple {
    pub subject: u64,
    pub predicate: u64,
    pub object: u64,
}

impl IdTriple {
    pub fn new(subject: u64, predicate: u64, object: u64) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// Returns true if two RDF terms are RDF-equal: same lexical form and
/// datatype, with language tags compared case-insensitively.
pub fn terms_equal(a: &Term, b: &Term) -> bool {
    match (a, b) {
        (Term::Literal(a), Term::Literal(b)) => {
            a.value() == b.value()
                && a.datatype() == b.datatype()
                && match (a.language(), b.language()) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    (None, None) => true,
                    _ => false,
                }
        }
        _ => a == b,
    }
}
