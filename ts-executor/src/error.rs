use ts_algebra::{AlgebraError, CompileError};
use ts_common::{EngineError, ErrorKind};

/// Errors the executor can raise at query/update granularity - as opposed
/// to per-binding evaluation failures, which `ts_functions` already folds
/// into "reject this binding" rather than surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("unsupported algebra pattern: {0}")]
    UnsupportedPattern(String),
    #[error("named graphs are not supported: {0}")]
    NamedGraphsNotSupported(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error("LOAD is not implemented")]
    LoadNotImplemented,
    #[error("query was cancelled")]
    Cancelled,
    #[error("query timed out")]
    Timeout,
    #[error("algebra tree exceeds the maximum nesting depth")]
    TooDeeplyNested,
    #[error("{what} exceeds the maximum of {limit} triples")]
    TooManyTriples { what: &'static str, limit: usize },
    #[error("WHERE pattern produced more than {0} matches")]
    TooManyMatches(usize),
    #[error("update template exceeds the maximum of {0} triples")]
    TemplateTooLarge(usize),
    #[error("invalid CLEAR target: {0}")]
    InvalidClearTarget(String),
    #[error("invalid update operation: {0}")]
    InvalidUpdateAst(String),
    #[error(transparent)]
    Storage(#[from] ts_storage::StorageError),
    #[error(transparent)]
    Optimize(#[from] ts_optimizer::OptimizeError),
    #[error(transparent)]
    Plan(#[from] ts_planner::PlanError),
    #[error(transparent)]
    Algebra(#[from] AlgebraError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl ExecutionError {
    /// Maps this error onto the public API's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::UnsupportedPattern(_) => ErrorKind::UnsupportedPattern,
            ExecutionError::NamedGraphsNotSupported(_) => ErrorKind::NamedGraphsNotSupported,
            ExecutionError::NotImplemented(_) => ErrorKind::UnsupportedOperation,
            ExecutionError::LoadNotImplemented => ErrorKind::LoadNotImplemented,
            ExecutionError::Cancelled => ErrorKind::Cancelled,
            ExecutionError::Timeout => ErrorKind::Timeout,
            ExecutionError::TooDeeplyNested => ErrorKind::TooDeeplyNested,
            ExecutionError::TooManyTriples { .. } => ErrorKind::TooManyTriples,
            ExecutionError::TooManyMatches(_) => ErrorKind::TooManyMatches,
            ExecutionError::TemplateTooLarge(_) => ErrorKind::TemplateTooLarge,
            ExecutionError::InvalidClearTarget(_) => ErrorKind::InvalidClearTarget,
            ExecutionError::InvalidUpdateAst(_) => ErrorKind::InvalidUpdateAst,
            ExecutionError::Storage(_) => ErrorKind::Storage,
            ExecutionError::Optimize(_) => ErrorKind::TooDeeplyNested,
            ExecutionError::Plan(err) => match err {
                ts_planner::PlanError::TooDeeplyNested => ErrorKind::TooDeeplyNested,
                ts_planner::PlanError::NoValidPlan => ErrorKind::NoValidPlan,
                ts_planner::PlanError::EmptyPatterns => ErrorKind::EmptyPatterns,
            },
            ExecutionError::Algebra(err) => match err {
                AlgebraError::TooDeeplyNested => ErrorKind::TooDeeplyNested,
                _ => ErrorKind::ParseError,
            },
            ExecutionError::Compile(_) => ErrorKind::ParseError,
        }
    }

    pub fn into_engine_error(self) -> EngineError {
        let kind = self.kind();
        EngineError::new(kind, self.to_string())
    }
}
