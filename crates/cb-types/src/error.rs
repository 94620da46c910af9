use thiserror::Error;

/// Errors produced by value-type parsing and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid username {name:?}: {reason}")]
    InvalidUsername { name: String, reason: String },

    #[error("invalid community name {name:?}: {reason}")]
    InvalidCommunityName { name: String, reason: String },

    #[error("invalid document key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}

pub type TypeResult<T> = Result<T, TypeError>;
