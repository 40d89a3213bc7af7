use ts_common::{EngineError, ErrorKind};

/// The public error type `query`/`stream_query` return - a thin,
/// `From`-convertible wrapper over [`ts_common::EngineError`] so callers
/// that only care about `{kind, detail}` can use that directly.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct QueryError(EngineError);

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }
}

impl From<ts_algebra::CompileError> for QueryError {
    fn from(err: ts_algebra::CompileError) -> Self {
        Self(EngineError::new(ErrorKind::ParseError, err.to_string()))
    }
}

impl From<ts_optimizer::OptimizeError> for QueryError {
    fn from(err: ts_optimizer::OptimizeError) -> Self {
        Self(EngineError::new(ErrorKind::TooDeeplyNested, err.to_string()))
    }
}

impl From<ts_executor::ExecutionError> for QueryError {
    fn from(err: ts_executor::ExecutionError) -> Self {
        Self(EngineError::new(err.kind(), err.to_string()))
    }
}

/// The public error type `update` returns. Kept distinct from
/// [`QueryError`] even though both currently wrap the same
/// [`EngineError`] shape, since SPARQL Update has its own partial-success
/// atomicity rule (§4.5.1) that a future revision may need to attach
/// extra context to (e.g. which operation in a multi-operation request
/// failed).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UpdateError(EngineError);

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }
}

impl From<ts_executor::ExecutionError> for UpdateError {
    fn from(err: ts_executor::ExecutionError) -> Self {
        Self(EngineError::new(err.kind(), err.to_string()))
    }
}
