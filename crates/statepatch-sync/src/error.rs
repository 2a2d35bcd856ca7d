use statepatch_diff::DiffError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("replica has no state yet; a `state` message must come before `{got}`")]
    NotInitialized { got: &'static str },

    #[error("out-of-order patch: expected sequence {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("patch error: {0}")]
    Diff(#[from] DiffError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
