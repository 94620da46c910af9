use cb_types::TypeError;

/// Errors raised by document mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// No comment with this id exists within the nesting bound.
    #[error("parent comment {parent_id} not found within depth {max_depth}")]
    ParentNotFoundOrTooDeep { parent_id: String, max_depth: usize },

    #[error("invalid vote value {0}: expected -1, 0 or 1")]
    InvalidVote(i64),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type ModelResult<T> = Result<T, ModelError>;
