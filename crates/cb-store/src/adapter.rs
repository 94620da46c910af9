use std::sync::Arc;

use bytes::Bytes;
use cb_types::Revision;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::paths::{join, validate_path};
use crate::traits::BlobBackend;

/// A document read from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched {
    pub content: Value,
    pub revision: Revision,
    /// The stored bytes were not valid JSON and `content` is a substituted
    /// empty object.
    pub corrupt: bool,
}

impl Fetched {
    /// `true` for `null`, `{}`, `[]` and `""`, the shapes that carry nothing
    /// worth decoding.
    pub fn is_empty(&self) -> bool {
        match &self.content {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Decode the content into a typed document.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.content)
    }
}

/// JSON document access over a [`BlobBackend`], scoped to a data root.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn BlobBackend>,
    root: String,
}

impl BlobStore {
    pub fn new(backend: Arc<dyn BlobBackend>) -> Self {
        Self::with_root(backend, "")
    }

    /// Place every document under `root` inside the backend.
    pub fn with_root(backend: Arc<dyn BlobBackend>, root: impl Into<String>) -> Self {
        Self {
            backend,
            root: root.into(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn BlobBackend> {
        &self.backend
    }

    fn full_path(&self, path: &str) -> StoreResult<String> {
        let full = join(&self.root, path);
        validate_path(&full)?;
        Ok(full)
    }

    /// Read the document at `path`.
    ///
    /// Oversized payloads are fetched through the backend's object path.
    /// A payload that is not valid JSON is logged and replaced by an empty
    /// object, paired with the real revision so the caller can repair it.
    pub async fn get(&self, path: &str) -> StoreResult<Fetched> {
        let full = self.full_path(path)?;
        let entry = self
            .backend
            .read_entry(&full)
            .await?
            .ok_or_else(|| StoreError::NotFound { path: path.to_string() })?;

        let payload = match entry.inline {
            Some(bytes) => bytes,
            None => {
                debug!(path, size = entry.size, "payload not inline, fetching object");
                self.backend.read_object(&entry.revision).await?.ok_or_else(|| {
                    StoreError::Backend(format!(
                        "object {} for {path} is missing",
                        entry.revision.short_hex()
                    ))
                })?
            }
        };

        match serde_json::from_slice::<Value>(&payload) {
            Ok(content) => Ok(Fetched {
                content,
                revision: entry.revision,
                corrupt: false,
            }),
            Err(error) => {
                warn!(
                    path,
                    revision = %entry.revision.short_hex(),
                    %error,
                    "corrupt document, substituting empty value"
                );
                Ok(Fetched {
                    content: Value::Object(Map::new()),
                    revision: entry.revision,
                    corrupt: true,
                })
            }
        }
    }

    /// Write `value` to `path`.
    ///
    /// `expected == None` creates the path and fails with
    /// [`StoreError::Conflict`] if it already exists; `Some(rev)` replaces the
    /// document only if it is still at `rev`.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        path: &str,
        value: &T,
        expected: Option<&Revision>,
        message: &str,
    ) -> StoreResult<Revision> {
        let full = self.full_path(path)?;
        let body =
            serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend
            .write_entry(&full, Bytes::from(body), expected, message)
            .await
            .map_err(|e| relative(e, path))
    }

    /// Delete `path` if it is still at `expected`.
    pub async fn delete(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()> {
        let full = self.full_path(path)?;
        self.backend
            .delete_entry(&full, expected, message)
            .await
            .map_err(|e| relative(e, path))
    }

    /// Paths directly under `dir`, relative to the data root.
    pub async fn list(&self, dir: &str) -> StoreResult<Vec<String>> {
        let full = self.full_path(dir)?;
        let root = self.root.trim_matches('/');
        let prefix = if root.is_empty() { String::new() } else { format!("{root}/") };
        Ok(self
            .backend
            .list_entries(&full)
            .await?
            .into_iter()
            .map(|p| match p.strip_prefix(&prefix) {
                Some(rest) => rest.to_string(),
                None => p.clone(),
            })
            .collect())
    }
}

/// Report errors against the caller's relative path rather than the
/// root-prefixed backend path.
fn relative(error: StoreError, path: &str) -> StoreError {
    match error {
        StoreError::NotFound { .. } => StoreError::NotFound { path: path.to_string() },
        StoreError::Conflict { expected, actual, .. } => StoreError::Conflict {
            path: path.to_string(),
            expected,
            actual,
        },
        other => other,
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore").field("root", &self.root).finish()
    }
}
