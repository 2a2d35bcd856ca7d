use thiserror::Error;

/// Errors produced when a value has the wrong shape for an operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("expected a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("expected a sequence, found {found}")]
    NotASequence { found: &'static str },
}
