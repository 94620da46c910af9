use cb_store::{BlobStore, StoreError};
use cb_types::Actor;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RetentionError, RetentionResult};
use crate::job::DEFAULT_BATCH_SIZE;

/// Path of the stored configuration under the data root.
pub const CONFIG_PATH: &str = "config.json";

/// Longest accepted retention period, roughly a century.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Runtime-tunable retention parameters, stored at [`CONFIG_PATH`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetentionConfig {
    pub retention_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { retention_days: 30 }
    }
}

impl RetentionConfig {
    pub fn validate(&self) -> RetentionResult<()> {
        if self.retention_days == 0 {
            return Err(RetentionError::InvalidConfig("retentionDays must be at least 1".into()));
        }
        if self.retention_days > MAX_RETENTION_DAYS {
            return Err(RetentionError::InvalidConfig(format!(
                "retentionDays must be at most {MAX_RETENTION_DAYS}"
            )));
        }
        Ok(())
    }
}

/// Process-level scheduling knobs. These live in the server configuration
/// file, not in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_size: usize,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Read the stored config. Missing or unreadable content yields defaults.
pub async fn load_config(store: &BlobStore) -> RetentionResult<RetentionConfig> {
    let fetched = match store.get(CONFIG_PATH).await {
        Ok(fetched) => fetched,
        Err(StoreError::NotFound { .. }) => return Ok(RetentionConfig::default()),
        Err(e) => return Err(e.into()),
    };
    match fetched.decode::<RetentionConfig>() {
        Ok(config) if config.validate().is_ok() => Ok(config),
        Ok(config) => {
            warn!(retention_days = config.retention_days, "stored retention config invalid, using defaults");
            Ok(RetentionConfig::default())
        }
        Err(error) => {
            warn!(%error, "stored retention config unreadable, using defaults");
            Ok(RetentionConfig::default())
        }
    }
}

/// Replace the stored config. Admin only.
pub async fn save_config(store: &BlobStore, config: &RetentionConfig, actor: &Actor) -> RetentionResult<()> {
    if !actor.is_admin {
        return Err(RetentionError::PermissionDenied {
            actor: actor.name.clone(),
        });
    }
    config.validate()?;

    let current = match store.get(CONFIG_PATH).await {
        Ok(fetched) => Some(fetched.revision),
        Err(StoreError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let message = format!("Set retention to {} days", config.retention_days);
    store.put(CONFIG_PATH, config, current.as_ref(), &message).await?;
    info!(retention_days = config.retention_days, actor = %actor.name, "retention config updated");
    Ok(())
}
