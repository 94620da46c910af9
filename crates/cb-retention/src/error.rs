use cb_index::IndexError;
use cb_repo::RepoError;
use cb_store::StoreError;

/// Errors from retention configuration and sweeps.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("{actor} may not change retention settings")]
    PermissionDenied { actor: String },

    #[error("invalid retention config: {0}")]
    InvalidConfig(String),
}

pub type RetentionResult<T> = Result<T, RetentionError>;
