use crate::{validate, Algebra, AlgebraError};
use ts_model::{TermOrVariable, Variable};

/// The four SPARQL query forms. An external text parser produces a
/// [`ParsedQuery`] carrying one of these plus the raw pattern algebra; this
/// module turns that into a validated, ready-to-optimize [`CompiledQuery`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Construct,
    Ask,
    Describe,
}

/// The raw shape an external SPARQL parser is expected to hand to this
/// crate: a query form plus its loosely-typed properties. This crate does
/// not parse SPARQL text itself - it only validates and normalizes what
/// the parser already extracted.
#[derive(Clone, Debug)]
pub struct ParsedQuery {
    pub query_type: QueryType,
    pub pattern: Algebra,
    pub dataset: Vec<TermOrVariable>,
    pub base_iri: Option<String>,
    /// CONSTRUCT template triples; empty for every other query type.
    pub template: Vec<(TermOrVariable, TermOrVariable, TermOrVariable)>,
}

/// A validated query ready to hand to the optimizer. `pattern` has already
/// passed [`validate`]; later stages may assume this invariant holds.
#[derive(Clone, Debug)]
pub struct CompiledQuery {
    pub query_type: QueryType,
    pub pattern: Algebra,
    pub dataset: Vec<TermOrVariable>,
    pub base_iri: Option<String>,
    pub template: Vec<(TermOrVariable, TermOrVariable, TermOrVariable)>,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("invalid pattern algebra: {0}")]
    InvalidPattern(#[from] AlgebraError),
    #[error("CONSTRUCT query requires a non-empty template")]
    EmptyConstructTemplate,
    #[error("template references variable {0:?} not bound by any BGP-level matching")]
    TemplateReferencesUnboundVariable(String),
}

/// Validates the pattern, checks query-type-specific constraints, and
/// returns a [`CompiledQuery`]. This is the single entry point the query
/// engine uses between the external parser and the optimizer.
pub fn compile(parsed: ParsedQuery) -> Result<CompiledQuery, CompileError> {
    validate(&parsed.pattern)?;

    if parsed.query_type == QueryType::Construct && parsed.template.is_empty() {
        return Err(CompileError::EmptyConstructTemplate);
    }

    if parsed.query_type == QueryType::Construct {
        let bound = crate::analysis::variables(&parsed.pattern)?;
        for (s, p, o) in &parsed.template {
            for position in [s, p, o] {
                if let TermOrVariable::Variable(v) = position {
                    check_template_variable_bound(v, &bound)?;
                }
            }
        }
    }

    Ok(CompiledQuery {
        query_type: parsed.query_type,
        pattern: parsed.pattern,
        dataset: parsed.dataset,
        base_iri: parsed.base_iri,
        template: parsed.template,
    })
}

fn check_template_variable_bound(
    v: &Variable,
    bound: &[Variable],
) -> Result<(), CompileError> {
    if bound.contains(v) {
        Ok(())
    } else {
        Err(CompileError::TemplateReferencesUnboundVariable(
            v.as_str().to_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_model::TriplePattern;

    fn var(name: &str) -> TermOrVariable {
        TermOrVariable::Variable(Variable::new(name).unwrap())
    }

    #[test]
    fn select_compiles_with_valid_pattern() {
        let parsed = ParsedQuery {
            query_type: QueryType::Select,
            pattern: Algebra::bgp(vec![TriplePattern::new(var("s"), var("p"), var("o"))]),
            dataset: vec![],
            base_iri: None,
            template: vec![],
        };
        assert!(compile(parsed).is_ok());
    }

    #[test]
    fn construct_with_empty_template_is_rejected() {
        let parsed = ParsedQuery {
            query_type: QueryType::Construct,
            pattern: Algebra::empty_bgp(),
            dataset: vec![],
            base_iri: None,
            template: vec![],
        };
        assert_eq!(compile(parsed), Err(CompileError::EmptyConstructTemplate));
    }

    #[test]
    fn construct_template_referencing_unbound_variable_is_rejected() {
        let parsed = ParsedQuery {
            query_type: QueryType::Construct,
            pattern: Algebra::bgp(vec![TriplePattern::new(var("s"), var("p"), var("o"))]),
            dataset: vec![],
            base_iri: None,
            template: vec![(var("s"), var("p"), var("unbound"))],
        };
        assert!(matches!(
            compile(parsed),
            Err(CompileError::TemplateReferencesUnboundVariable(_))
        ));
    }

    #[test]
    fn invalid_pattern_surfaces_algebra_error() {
        let parsed = ParsedQuery {
            query_type: QueryType::Select,
            pattern: Algebra::slice(Algebra::empty_bgp(), -1, None),
            dataset: vec![],
            base_iri: None,
            template: vec![],
        };
        assert!(matches!(compile(parsed), Err(CompileError::InvalidPattern(_))));
    }
}
