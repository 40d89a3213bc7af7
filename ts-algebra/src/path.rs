use ts_model::Term;

/// A SPARQL 1.1 property path expression. Parsing and algebra
/// construction are fully supported; evaluation is not (see the
/// specification's non-goals) - the executor reports
/// `unsupported_pattern` for any `Algebra::Path` node it is asked to run.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyPath {
    Link(Term),
    Inverse(Box<PropertyPath>),
    Sequence(Box<PropertyPath>, Box<PropertyPath>),
    Alternative(Box<PropertyPath>, Box<PropertyPath>),
    ZeroOrMore(Box<PropertyPath>),
    OneOrMore(Box<PropertyPath>),
    ZeroOrOne(Box<PropertyPath>),
    NegatedPropertySet(Vec<Term>),
}
