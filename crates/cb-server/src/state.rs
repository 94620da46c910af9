use std::sync::Arc;

use cb_repo::Board;
use cb_retention::RetentionJob;

use crate::auth::ActorSource;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub board: Board,
    pub retention: RetentionJob,
    pub actors: Arc<dyn ActorSource>,
}

impl AppState {
    pub fn new(board: Board, retention: RetentionJob, actors: Arc<dyn ActorSource>) -> Self {
        Self { board, retention, actors }
    }
}
