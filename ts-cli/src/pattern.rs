use anyhow::{bail, Context};
use ts_model::{NamedNode, Term, TermOrVariable, Triple, TriplePattern, Variable};

/// Parses one whitespace-separated `subject predicate object` line into a
/// triple pattern. Each slot is one of `<iri>`, `?variable`, or a bare
/// `"literal"` (double-quoted, no escapes, no datatype/language tag) -
/// the minimal term grammar this command-line surface needs, not a
/// general Turtle/N-Triples term parser.
pub fn parse_pattern_line(line: &str) -> anyhow::Result<TriplePattern> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [subject, predicate, object] = parts.as_slice() else {
        bail!("expected exactly 3 whitespace-separated terms, got: {line:?}");
    };
    Ok(TriplePattern::new(
        parse_term_or_variable(subject)?,
        parse_term_or_variable(predicate)?,
        parse_term_or_variable(object)?,
    ))
}

fn parse_term_or_variable(token: &str) -> anyhow::Result<TermOrVariable> {
    if let Some(name) = token.strip_prefix('?') {
        return Ok(TermOrVariable::Variable(
            Variable::new(name).with_context(|| format!("invalid variable name: {token:?}"))?,
        ));
    }
    Ok(TermOrVariable::Term(parse_term(token)?))
}

fn parse_term(token: &str) -> anyhow::Result<Term> {
    if let Some(iri) = token.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return Ok(Term::NamedNode(
            NamedNode::new(iri).with_context(|| format!("invalid IRI: {token:?}"))?,
        ));
    }
    if let Some(value) = token.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Ok(Term::Literal(value.into()));
    }
    bail!("expected <iri>, ?variable, or \"literal\", got: {token:?}")
}

/// Parses one whitespace-separated ground `<s> <p> <o>`-or-`"literal"`
/// triple line for `ts load`. No blank nodes: the minimal command-line
/// surface has no way to preserve blank-node identity across invocations.
pub fn parse_ground_triple_line(line: &str) -> anyhow::Result<(Term, Term, Term)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [subject, predicate, object] = parts.as_slice() else {
        bail!("expected exactly 3 whitespace-separated terms, got: {line:?}");
    };
    Ok((parse_term(subject)?, parse_term(predicate)?, parse_term(object)?))
}

pub fn triple_to_ground(triple: Triple) -> (Term, Term, Term) {
    (
        match triple.subject {
            ts_model::Subject::NamedNode(n) => Term::NamedNode(n),
            ts_model::Subject::BlankNode(b) => Term::BlankNode(b),
        },
        Term::NamedNode(triple.predicate),
        triple.object,
    )
}
