use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cb_repo::RepoError;
use cb_retention::RetentionError;
use cb_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Retention(#[from] RetentionError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("missing or invalid x-actor header")]
    Unauthenticated,

    #[error("{actor} may not {action}")]
    Forbidden { actor: String, action: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

fn repo_status(error: &RepoError) -> StatusCode {
    match error {
        RepoError::NotFound { .. } => StatusCode::NOT_FOUND,
        RepoError::AlreadyExists { .. } | RepoError::Conflict { .. } => StatusCode::CONFLICT,
        RepoError::Validation(_) => StatusCode::BAD_REQUEST,
        RepoError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        RepoError::ParentNotFoundOrTooDeep { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Repo(e) => repo_status(e),
            Self::Retention(RetentionError::Repo(e)) => repo_status(e),
            Self::Retention(RetentionError::PermissionDenied { .. }) | Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Retention(RetentionError::InvalidConfig(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
