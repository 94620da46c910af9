//! Backends with scripted misbehaviour for exercising retry and drift paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use cb_store::{BlobBackend, Entry, InMemoryBlobStore, Revision, StoreError, StoreResult};
use serde_json::Value;

/// Memory backend that yields to the scheduler after every entry read, so
/// two operations joined on one task both read before either writes.
#[derive(Default)]
pub(crate) struct Interleaving {
    pub inner: InMemoryBlobStore,
    pub conflicts: AtomicU32,
}

#[async_trait]
impl BlobBackend for Interleaving {
    async fn read_entry(&self, path: &str) -> StoreResult<Option<Entry>> {
        let entry = self.inner.read_entry(path).await;
        tokio::task::yield_now().await;
        entry
    }

    async fn read_object(&self, revision: &Revision) -> StoreResult<Option<Bytes>> {
        self.inner.read_object(revision).await
    }

    async fn write_entry(
        &self,
        path: &str,
        content: Bytes,
        expected: Option<&Revision>,
        message: &str,
    ) -> StoreResult<Revision> {
        let result = self.inner.write_entry(path, content, expected, message).await;
        if matches!(result, Err(StoreError::Conflict { .. })) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        result
    }

    async fn delete_entry(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()> {
        self.inner.delete_entry(path, expected, message).await
    }

    async fn list_entries(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.list_entries(prefix).await
    }
}

/// Memory backend where another writer always gets to `target` first:
/// before each compare-and-swap write there, it stamps `field` and commits.
pub(crate) struct AlwaysBeaten {
    pub inner: InMemoryBlobStore,
    pub target: String,
    pub field: &'static str,
}

#[async_trait]
impl BlobBackend for AlwaysBeaten {
    async fn read_entry(&self, path: &str) -> StoreResult<Option<Entry>> {
        self.inner.read_entry(path).await
    }

    async fn read_object(&self, revision: &Revision) -> StoreResult<Option<Bytes>> {
        self.inner.read_object(revision).await
    }

    async fn write_entry(
        &self,
        path: &str,
        content: Bytes,
        expected: Option<&Revision>,
        message: &str,
    ) -> StoreResult<Revision> {
        if expected.is_some() && path == self.target {
            if let Some(current) = self.inner.read_entry(path).await? {
                let raw = current.inline.unwrap_or_default();
                let mut doc: Value =
                    serde_json::from_slice(&raw).map_err(|e| StoreError::Backend(e.to_string()))?;
                let bumped = doc[self.field].as_u64().unwrap_or(0) + 1;
                doc[self.field] = Value::from(bumped);
                let body = serde_json::to_vec(&doc).map_err(|e| StoreError::Backend(e.to_string()))?;
                self.inner
                    .write_entry(path, Bytes::from(body), Some(&current.revision), "competing writer")
                    .await?;
            }
        }
        self.inner.write_entry(path, content, expected, message).await
    }

    async fn delete_entry(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()> {
        self.inner.delete_entry(path, expected, message).await
    }

    async fn list_entries(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.list_entries(prefix).await
    }
}

/// Memory backend whose writes to the listed paths fail outright.
pub(crate) struct Unwritable {
    pub inner: InMemoryBlobStore,
    pub paths: HashSet<String>,
}

#[async_trait]
impl BlobBackend for Unwritable {
    async fn read_entry(&self, path: &str) -> StoreResult<Option<Entry>> {
        self.inner.read_entry(path).await
    }

    async fn read_object(&self, revision: &Revision) -> StoreResult<Option<Bytes>> {
        self.inner.read_object(revision).await
    }

    async fn write_entry(
        &self,
        path: &str,
        content: Bytes,
        expected: Option<&Revision>,
        message: &str,
    ) -> StoreResult<Revision> {
        if self.paths.contains(path) {
            return Err(StoreError::Backend(format!("{path} is read-only")));
        }
        self.inner.write_entry(path, content, expected, message).await
    }

    async fn delete_entry(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()> {
        self.inner.delete_entry(path, expected, message).await
    }

    async fn list_entries(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.list_entries(prefix).await
    }
}
