#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("algebra tree exceeds the recursion depth limit during planning")]
    TooDeeplyNested,
    #[error("no valid join plan could be constructed")]
    NoValidPlan,
    #[error("cannot plan a join over zero patterns")]
    EmptyPatterns,
}

impl From<ts_algebra::AlgebraError> for PlanError {
    fn from(_: ts_algebra::AlgebraError) -> Self {
        PlanError::TooDeeplyNested
    }
}
