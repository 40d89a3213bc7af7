use ts_common::limits::MAX_DEPTH;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OptimizeError {
    #[error("algebra tree exceeds MAX_DEPTH ({MAX_DEPTH}) during optimization")]
    TooDeeplyNested,
}

impl From<ts_algebra::AlgebraError> for OptimizeError {
    fn from(err: ts_algebra::AlgebraError) -> Self {
        match err {
            ts_algebra::AlgebraError::TooDeeplyNested => OptimizeError::TooDeeplyNested,
            // The optimizer only ever rebuilds trees validate() already
            // accepted, so no other AlgebraError variant should reach here.
            _ => OptimizeError::TooDeeplyNested,
        }
    }
}
