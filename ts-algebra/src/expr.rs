use crate::Algebra;
use ts_model::{Term, Variable};

/// A scalar SPARQL expression, as found in `FILTER`, `BIND`, `ORDER BY`
/// keys and aggregate arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Term(Term),
    Variable(Variable),
    /// `BOUND(?v)` looks at whether `v` is bound without evaluating it, so
    /// it carries the variable directly rather than a sub-expression.
    Bound(Variable),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    UnaryPlus(Box<Expr>),
    UnaryMinus(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Subtract(Box<Expr>, Box<Expr>),
    Multiply(Box<Expr>, Box<Expr>),
    Divide(Box<Expr>, Box<Expr>),
    Equal(Box<Expr>, Box<Expr>),
    Less(Box<Expr>, Box<Expr>),
    Greater(Box<Expr>, Box<Expr>),
    LessOrEqual(Box<Expr>, Box<Expr>),
    GreaterOrEqual(Box<Expr>, Box<Expr>),
    In(Box<Expr>, Vec<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Coalesce(Vec<Expr>),
    Call(BuiltinFunction, Vec<Expr>),
    /// Accepted by the algebra but not evaluated; the evaluator returns an
    /// error if asked to evaluate one.
    Exists(Box<Algebra>),
    NotExists(Box<Algebra>),
}

impl Expr {
    pub fn term(term: Term) -> Self {
        Expr::Term(term)
    }

    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Term(_) | Expr::Variable(_) | Expr::Bound(_) => vec![],
            Expr::Not(e) | Expr::UnaryPlus(e) | Expr::UnaryMinus(e) => vec![e.as_ref()],
            Expr::And(l, r)
            | Expr::Or(l, r)
            | Expr::Add(l, r)
            | Expr::Subtract(l, r)
            | Expr::Multiply(l, r)
            | Expr::Divide(l, r)
            | Expr::Equal(l, r)
            | Expr::Less(l, r)
            | Expr::Greater(l, r)
            | Expr::LessOrEqual(l, r)
            | Expr::GreaterOrEqual(l, r) => vec![l.as_ref(), r.as_ref()],
            Expr::In(e, list) => std::iter::once(e.as_ref()).chain(list.iter()).collect(),
            Expr::If(c, t, e) => vec![c.as_ref(), t.as_ref(), e.as_ref()],
            Expr::Coalesce(list) => list.iter().collect(),
            Expr::Call(_, args) => args.iter().collect(),
            Expr::Exists(_) | Expr::NotExists(_) => vec![],
        }
    }

    /// True iff this expression contains no variable reference (directly,
    /// or via a nested `EXISTS`/`NOT EXISTS` pattern - treated conservatively
    /// as non-constant since they depend on dataset state).
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Term(_) => true,
            Expr::Variable(_) | Expr::Bound(_) | Expr::Exists(_) | Expr::NotExists(_) => false,
            _ => self.children().iter().all(|c| c.is_constant()),
        }
    }

    /// The set of variables this expression references, in first-occurrence
    /// order without duplicates. Variables inside `EXISTS`/`NOT EXISTS`
    /// sub-patterns are not included: they are scoped to that sub-pattern.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut out = Vec::new();
        collect_expr_variables(self, &mut out);
        out
    }
}

fn collect_expr_variables<'e>(expr: &'e Expr, out: &mut Vec<&'e Variable>) {
    match expr {
        Expr::Variable(v) | Expr::Bound(v) => {
            if !out.contains(&v) {
                out.push(v);
            }
        }
        Expr::Exists(_) | Expr::NotExists(_) | Expr::Term(_) => {}
        _ => {
            for child in expr.children() {
                collect_expr_variables(child, out);
            }
        }
    }
}

/// The closed set of SPARQL built-in functions the evaluator supports.
/// `Custom` carries through any function IRI the algebra builder did not
/// recognize, so the evaluator can report "unknown function" uniformly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuiltinFunction {
    Str,
    Lang,
    Datatype,
    Iri,
    BNode,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    StrLen,
    Substr,
    UCase,
    LCase,
    StrStarts,
    StrEnds,
    Contains,
    StrBefore,
    StrAfter,
    EncodeForUri,
    Concat,
    LangMatches,
    Regex,
    Replace,
    Abs,
    Round,
    Ceil,
    Floor,
    Rand,
    Now,
    Year,
    Month,
    Day,
    Hours,
    Minutes,
    Seconds,
    Timezone,
    Tz,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    StrDt,
    StrLang,
    SameTerm,
    Custom(String),
}

/// The aggregate functions usable inside `Group`.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateExpr {
    Count { expr: Option<Box<Expr>>, distinct: bool },
    Sum { expr: Box<Expr>, distinct: bool },
    Avg { expr: Box<Expr>, distinct: bool },
    Min { expr: Box<Expr> },
    Max { expr: Box<Expr> },
    GroupConcat {
        expr: Box<Expr>,
        distinct: bool,
        separator: Option<String>,
    },
    Sample { expr: Box<Expr> },
}

impl AggregateExpr {
    pub fn inner_expr(&self) -> Option<&Expr> {
        match self {
            AggregateExpr::Count { expr, .. } => expr.as_deref(),
            AggregateExpr::Sum { expr, .. }
            | AggregateExpr::Avg { expr, .. }
            | AggregateExpr::Min { expr }
            | AggregateExpr::Max { expr }
            | AggregateExpr::GroupConcat { expr, .. }
            | AggregateExpr::Sample { expr } => Some(expr),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::xsd;
    use oxrdf::Literal;
    use ts_model::Term;

    fn var(name: &str) -> Expr {
        Expr::Variable(Variable::new(name).unwrap())
    }

    fn int(value: i64) -> Expr {
        Expr::Term(Term::Literal(Literal::new_typed_literal(
            value.to_string(),
            xsd::INTEGER,
        )))
    }

    #[test]
    fn closed_expression_has_no_variables() {
        let e = Expr::Add(Box::new(int(1)), Box::new(int(2)));
        assert!(e.is_constant());
        assert!(e.variables().is_empty());
    }

    #[test]
    fn expression_with_variable_is_not_constant() {
        let e = Expr::Add(Box::new(var("a")), Box::new(int(1)));
        assert!(!e.is_constant());
        assert_eq!(e.variables().len(), 1);
    }

    #[test]
    fn variables_are_deduplicated_in_first_occurrence_order() {
        let e = Expr::Add(Box::new(var("a")), Box::new(var("a")));
        assert_eq!(e.variables().len(), 1);
    }
}
