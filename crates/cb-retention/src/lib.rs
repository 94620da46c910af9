//! Retention for commitboard.
//!
//! Posts older than the configured age that never attracted a comment are
//! hard-deleted: their document and their index entry go, while community
//! and author post lists keep the now-dangling id.
//!
//! # Key Types
//!
//! - [`RetentionConfig`] -- the stored `config.json` tunable
//! - [`RetentionJob`] -- one bounded sweep, returning a [`RetentionReport`]
//! - [`RetentionScheduler`] -- runs the job on an interval until shut down

pub mod config;
pub mod error;
pub mod job;
pub mod scheduler;

pub use config::{
    load_config, save_config, RetentionConfig, RetentionSettings, CONFIG_PATH, MAX_RETENTION_DAYS,
};
pub use error::{RetentionError, RetentionResult};
pub use job::{RetentionJob, RetentionReport, DEFAULT_BATCH_SIZE};
pub use scheduler::RetentionScheduler;
