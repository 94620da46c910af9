//! Error types for the index crate.

use cb_store::StoreError;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every attempt to write the index lost a revision race.
    #[error("index still contended after {attempts} attempts")]
    Contended { attempts: u32 },
}

impl IndexError {
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Store(e) => e.is_conflict(),
            Self::Contended { .. } => true,
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
