use cb_index::IndexError;
use cb_model::ModelError;
use cb_store::StoreError;
use cb_types::{EntityKind, TypeError};

/// Errors surfaced by board operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: EntityKind, key: String },

    /// Every attempt lost the revision race.
    #[error("write conflict at {path} after {attempts} attempts")]
    Conflict { path: String, attempts: u32 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{actor} may not {action}")]
    PermissionDenied { actor: String, action: String },

    #[error("parent comment {parent_id} not found within depth {max_depth}")]
    ParentNotFoundOrTooDeep { parent_id: String, max_depth: usize },

    /// A multi-document operation stopped after some of its writes had
    /// already committed.
    #[error("{operation} partially applied: committed {committed:?}, failed at {failed_step}: {source}")]
    PartialWriteDrift {
        operation: String,
        committed: Vec<String>,
        failed_step: String,
        #[source]
        source: Box<RepoError>,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl RepoError {
    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound { kind, key: key.into() }
    }

    pub fn denied(actor: &str, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            actor: actor.to_string(),
            action: action.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Store(e) => e.is_not_found(),
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Store(e) => e.is_conflict(),
            Self::Index(e) => e.is_conflict(),
            _ => false,
        }
    }
}

impl From<ModelError> for RepoError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::ParentNotFoundOrTooDeep { parent_id, max_depth } => {
                Self::ParentNotFoundOrTooDeep { parent_id, max_depth }
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<TypeError> for RepoError {
    fn from(error: TypeError) -> Self {
        Self::Validation(error.to_string())
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
