use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cb_retention::RetentionSettings;
use cb_store::{BlobStore, FsBlobStore, InMemoryBlobStore, RetryPolicy, DEFAULT_INLINE_LIMIT};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Where documents are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory,
    Fs { root: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Fs {
            root: PathBuf::from("./data"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    /// Data root prefix inside the backend.
    pub data_root: String,
    pub inline_limit: usize,
    pub retry: RetryPolicy,
    pub retention: RetentionSettings,
    /// Usernames treated as site admins.
    pub admins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            storage: StorageConfig::default(),
            data_root: String::new(),
            inline_limit: DEFAULT_INLINE_LIMIT,
            retry: RetryPolicy::default(),
            retention: RetentionSettings::default(),
            admins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub async fn load(path: &Path) -> ServerResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Open the configured backend.
    pub async fn open_store(&self) -> ServerResult<BlobStore> {
        let store = match &self.storage {
            StorageConfig::Memory => BlobStore::with_root(
                Arc::new(InMemoryBlobStore::with_inline_limit(self.inline_limit)),
                self.data_root.clone(),
            ),
            StorageConfig::Fs { root } => BlobStore::with_root(
                Arc::new(FsBlobStore::open_with_inline_limit(root.clone(), self.inline_limit).await?),
                self.data_root.clone(),
            ),
        };
        Ok(store)
    }
}
