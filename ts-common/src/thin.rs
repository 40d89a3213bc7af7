/// A light-weight result for SPARQL expression evaluation.
///
/// Most evaluation failures (unbound variable, type mismatch, division by
/// zero, ...) are *expected*: SPARQL's semantics define exactly what a
/// consumer does with them (reject the binding in `FILTER`, pass it through
/// unchanged in `BIND`, skip it in an aggregate). They are not bugs, so we
/// do not pay for a backtrace or a heap-allocated message on every one.
pub type ThinResult<T> = Result<T, ThinError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ThinError {
    #[error("expression evaluation failed")]
    Expected,
}

impl ThinError {
    pub fn expected<T>() -> ThinResult<T> {
        Err(ThinError::Expected)
    }
}

macro_rules! implement_from {
    ($t:ty) => {
        impl From<$t> for ThinError {
            fn from(_: $t) -> Self {
                ThinError::Expected
            }
        }
    };
}

implement_from!(std::num::ParseIntError);
implement_from!(std::num::ParseFloatError);
implement_from!(std::str::ParseBoolError);
implement_from!(std::num::TryFromIntError);
