use std::time::Duration;

use cb_store::BlobStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::load_config;
use crate::job::{RetentionJob, RetentionReport};

/// Runs [`RetentionJob`] on a fixed interval in a background task.
///
/// Each tick re-reads the stored config, so changes apply from the next
/// sweep. Failures are logged and never reach request handlers.
#[derive(Clone, Debug)]
pub struct RetentionScheduler {
    store: BlobStore,
    job: RetentionJob,
    period: Duration,
}

impl RetentionScheduler {
    pub fn new(store: BlobStore, job: RetentionJob, period: Duration) -> Self {
        Self { store, job, period }
    }

    /// One sweep with the stored config. Errors are logged and swallowed.
    pub async fn tick(&self) -> Option<RetentionReport> {
        let config = match load_config(&self.store).await {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "could not load retention config, skipping sweep");
                return None;
            }
        };
        match self.job.run(&config).await {
            Ok(report) => Some(report),
            Err(error) => {
                warn!(%error, "retention sweep failed");
                None
            }
        }
    }

    /// Start sweeping until `shutdown` flips to `true` or its sender drops.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(period_secs = self.period.as_secs(), "retention scheduler started");
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("retention scheduler stopped");
        })
    }
}
