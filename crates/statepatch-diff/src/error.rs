//! Error types for the diff crate.

use std::fmt;

use statepatch_types::TypeError;

/// Dotted key path from the root of a state to the value an error concerns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The root of the state.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[&str]> for KeyPath {
    fn from(path: &[&str]) -> Self {
        Self(path.iter().map(|s| s.to_string()).collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

/// Errors that can occur when applying a change list or edit script.
///
/// Diffing itself never fails; every variant here describes input that does
/// not fit the change it is paired with.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    /// A nested change targeted a value that is missing or not a mapping.
    #[error("expected a mapping at {path}, found {found}")]
    NotAMapping { path: KeyPath, found: &'static str },

    /// An array edit script targeted a value that is missing or not a sequence.
    #[error("expected a sequence at {path}, found {found}")]
    NotASequence { path: KeyPath, found: &'static str },

    /// An edit op does not fit the sequence it is applied to.
    #[error(
        "edit {index} at {path} is out of range: old position {old_pos}, \
         span {span}, sequence length {len}"
    )]
    EditOutOfRange {
        path: KeyPath,
        index: usize,
        old_pos: usize,
        span: usize,
        len: usize,
    },

    /// The shallow patcher only understands `updated` and `removed`.
    #[error("shallow patch cannot apply an `{change}` change at {path}")]
    UnsupportedChange { path: KeyPath, change: &'static str },

    /// A value passed in as the root had the wrong shape.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl DiffError {
    /// Re-anchor a path-carrying error at `path`.
    pub(crate) fn at(self, path: &[&str]) -> Self {
        match self {
            DiffError::EditOutOfRange { index, old_pos, span, len, .. } => {
                DiffError::EditOutOfRange { path: KeyPath::from(path), index, old_pos, span, len }
            }
            other => other,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
