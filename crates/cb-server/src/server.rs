use std::sync::Arc;
use std::time::Duration;

use cb_repo::Board;
use cb_retention::{RetentionJob, RetentionScheduler};
use cb_store::BlobStore;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::HeaderActorSource;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Board HTTP server with its retention scheduler.
pub struct BoardServer {
    config: ServerConfig,
    state: AppState,
}

impl BoardServer {
    /// Build a server over an already opened store.
    pub fn new(config: ServerConfig, store: BlobStore) -> Self {
        let board = Board::with_retry(store, config.retry.clone());
        let retention = RetentionJob::new(board.store().clone(), board.index().clone())
            .with_batch_size(config.retention.batch_size);
        let actors = Arc::new(HeaderActorSource::new(config.admins.iter().cloned()));
        Self {
            state: AppState::new(board, retention, actors),
            config,
        }
    }

    /// Open the configured backend and build a server over it.
    pub async fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = config.open_store().await?;
        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    fn scheduler(&self) -> RetentionScheduler {
        RetentionScheduler::new(
            self.state.board.store().clone(),
            self.state.retention.clone(),
            Duration::from_secs(self.config.retention.interval_secs.max(1)),
        )
    }

    /// Serve until ctrl-c, then stop the scheduler.
    pub async fn serve(self) -> ServerResult<()> {
        let (stop, stopped) = watch::channel(false);
        let sweeper = self
            .config
            .retention
            .enabled
            .then(|| self.scheduler().spawn(stopped));

        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, "board server listening");
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        let _ = stop.send(true);
        if let Some(handle) = sweeper {
            if let Err(e) = handle.await {
                warn!(error = %e, "retention scheduler task failed");
            }
        }
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
