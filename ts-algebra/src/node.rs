use crate::path::PropertyPath;
use crate::{AggregateExpr, Expr, OrderDirection};
use ts_model::{Term, TermOrVariable, TriplePattern, Variable};

/// The SPARQL algebra intermediate representation: a tagged tree of
/// pattern and solution-modifier nodes. Every recursive traversal in this
/// crate (and in the optimizer) matches exhaustively over this enum, so
/// adding a variant is a compile error everywhere it is not yet handled.
#[derive(Clone, Debug, PartialEq)]
pub enum Algebra {
    Bgp(Vec<TriplePattern>),
    Join(Box<Algebra>, Box<Algebra>),
    LeftJoin(Box<Algebra>, Box<Algebra>, Option<Expr>),
    Minus(Box<Algebra>, Box<Algebra>),
    Union(Box<Algebra>, Box<Algebra>),
    Filter(Expr, Box<Algebra>),
    Extend(Box<Algebra>, Variable, Expr),
    Group(Box<Algebra>, Vec<Variable>, Vec<(Variable, AggregateExpr)>),
    Project(Box<Algebra>, Vec<Variable>),
    Distinct(Box<Algebra>),
    Reduced(Box<Algebra>),
    OrderBy(Box<Algebra>, Vec<(OrderDirection, Expr)>),
    /// Offset is a signed quantity so that a negative value parsed from a
    /// raw query AST is representable and can be rejected by `validate`
    /// rather than silently wrapping.
    Slice(Box<Algebra>, i64, Option<u64>),
    Values(Vec<Variable>, Vec<Vec<Option<Term>>>),
    Service(TermOrVariable, Box<Algebra>, bool),
    Graph(TermOrVariable, Box<Algebra>),
    Path(TermOrVariable, PropertyPath, TermOrVariable),
}

impl Algebra {
    pub fn bgp(patterns: Vec<TriplePattern>) -> Self {
        Algebra::Bgp(patterns)
    }

    pub fn empty_bgp() -> Self {
        Algebra::Bgp(Vec::new())
    }

    /// True for the canonical "matches nothing" subtree the optimizer
    /// substitutes for contradictions (`FILTER(false)`) and propagates
    /// through joins/unions.
    pub fn is_empty_bgp(&self) -> bool {
        matches!(self, Algebra::Bgp(patterns) if patterns.is_empty())
    }

    pub fn join(left: Algebra, right: Algebra) -> Self {
        Algebra::Join(Box::new(left), Box::new(right))
    }

    pub fn left_join(left: Algebra, right: Algebra, filter: Option<Expr>) -> Self {
        Algebra::LeftJoin(Box::new(left), Box::new(right), filter)
    }

    pub fn minus(left: Algebra, right: Algebra) -> Self {
        Algebra::Minus(Box::new(left), Box::new(right))
    }

    pub fn union(left: Algebra, right: Algebra) -> Self {
        Algebra::Union(Box::new(left), Box::new(right))
    }

    pub fn filter(expr: Expr, inner: Algebra) -> Self {
        Algebra::Filter(expr, Box::new(inner))
    }

    pub fn extend(inner: Algebra, var: Variable, expr: Expr) -> Self {
        Algebra::Extend(Box::new(inner), var, expr)
    }

    pub fn project(inner: Algebra, vars: Vec<Variable>) -> Self {
        Algebra::Project(Box::new(inner), vars)
    }

    pub fn distinct(inner: Algebra) -> Self {
        Algebra::Distinct(Box::new(inner))
    }

    pub fn slice(inner: Algebra, offset: i64, limit: Option<u64>) -> Self {
        Algebra::Slice(Box::new(inner), offset, limit)
    }
}
