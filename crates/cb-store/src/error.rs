use cb_types::Revision;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing is stored at the path.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The stored revision differs from the one the writer held.
    #[error("revision conflict at {path}: expected {}, found {}", fmt_rev(.expected), fmt_rev(.actual))]
    Conflict {
        path: String,
        expected: Option<Revision>,
        actual: Option<Revision>,
    },

    /// The path is empty, absolute, or escapes the data root.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Serialization of an outgoing document failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a local backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other transport failure reported by the backend.
    #[error("backend error: {0}")]
    Backend(String),
}

fn fmt_rev(rev: &Option<Revision>) -> String {
    rev.map(|r| r.short_hex()).unwrap_or_else(|| "none".into())
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
