use std::fmt;

/// The public error shape of the query/update API: a stable `kind` tag
/// plus a human-readable `detail` message.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// The taxonomy of errors the public API can return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    UnsupportedPattern,
    UnsupportedOperation,
    TooManyTriples,
    TooManyMatches,
    TemplateTooLarge,
    InvalidUpdateAst,
    InvalidClearTarget,
    BindingMismatch,
    TermNotFound,
    UnknownInlineType,
    OutOfRange,
    RegexTimeout,
    Timeout,
    TooDeeplyNested,
    NoValidPlan,
    EmptyPatterns,
    LoadNotImplemented,
    NamedGraphsNotSupported,
    Cancelled,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ParseError => "parse_error",
            Self::UnsupportedPattern => "unsupported_pattern",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::TooManyTriples => "too_many_triples",
            Self::TooManyMatches => "too_many_matches",
            Self::TemplateTooLarge => "template_too_large",
            Self::InvalidUpdateAst => "invalid_update_ast",
            Self::InvalidClearTarget => "invalid_clear_target",
            Self::BindingMismatch => "binding_mismatch",
            Self::TermNotFound => "term_not_found",
            Self::UnknownInlineType => "unknown_inline_type",
            Self::OutOfRange => "out_of_range",
            Self::RegexTimeout => "regex_timeout",
            Self::Timeout => "timeout",
            Self::TooDeeplyNested => "too_deeply_nested",
            Self::NoValidPlan => "no_valid_plan",
            Self::EmptyPatterns => "empty_patterns",
            Self::LoadNotImplemented => "load_not_implemented",
            Self::NamedGraphsNotSupported => "named_graphs_not_supported",
            Self::Cancelled => "cancelled",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}
