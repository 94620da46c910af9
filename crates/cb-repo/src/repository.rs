//! Retried read-modify-write over stored documents.

use cb_index::Index;
use cb_store::{BlobStore, Revision, RetryPolicy};
use cb_types::EntityKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{RepoError, RepoResult};
use crate::resolver::{DualPathResolver, Resolved};

/// Document access shared by every board operation.
#[derive(Clone, Debug)]
pub struct Repository {
    store: BlobStore,
    index: Index,
    resolver: DualPathResolver,
    retry: RetryPolicy,
}

impl Repository {
    pub fn new(store: BlobStore, retry: RetryPolicy) -> Self {
        Self {
            index: Index::with_retry(store.clone(), retry.clone()),
            resolver: DualPathResolver::new(store.clone()),
            store,
            retry,
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn resolver(&self) -> &DualPathResolver {
        &self.resolver
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Resolve a document through the direct path, then the index.
    pub async fn read<T: DeserializeOwned>(&self, kind: EntityKind, key: &str) -> RepoResult<Resolved<T>> {
        self.resolver.resolve(kind, key, &self.index).await
    }

    /// Blind-create a document at its direct path.
    pub async fn create<T>(&self, kind: EntityKind, key: &str, value: &T, message: &str) -> RepoResult<(String, Revision)>
    where
        T: Serialize + Sync,
    {
        let path = kind.direct_path(key);
        match self.store.put(&path, value, None, message).await {
            Ok(revision) => Ok((path, revision)),
            Err(e) if e.is_conflict() => Err(RepoError::AlreadyExists {
                kind,
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `mutate` to the current document and write it back.
    ///
    /// A lost revision race re-reads the document and re-runs `mutate` on the
    /// fresh copy. Errors returned by `mutate` abort without retrying.
    pub async fn modify<T, R, F>(&self, kind: EntityKind, key: &str, message: &str, mut mutate: F) -> RepoResult<(T, R)>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        R: Send,
        F: FnMut(&mut T) -> RepoResult<R> + Send,
    {
        let attempts = self.retry.attempts();
        let mut last_path = kind.direct_path(key);
        for attempt in 0..attempts {
            if attempt > 0 {
                self.retry.pause(attempt - 1).await;
            }
            let Resolved { mut value, revision, path } = self.read::<T>(kind, key).await?;
            let out = mutate(&mut value)?;
            match self.store.put(&path, &value, Some(&revision), message).await {
                Ok(_) => return Ok((value, out)),
                Err(e) if e.is_conflict() => {
                    debug!(%kind, key, attempt, "revision conflict, retrying");
                    last_path = path;
                }
                Err(e) if e.is_not_found() => return Err(RepoError::not_found(kind, key)),
                Err(e) => return Err(e.into()),
            }
        }
        Err(RepoError::Conflict {
            path: last_path,
            attempts,
        })
    }
}

/// Tracks the writes of a multi-document operation so a late failure is
/// reported as drift instead of success or a plain error.
#[derive(Debug)]
pub(crate) struct WriteTrail {
    operation: &'static str,
    committed: Vec<String>,
}

impl WriteTrail {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self {
            operation,
            committed: Vec::new(),
        }
    }

    pub(crate) fn committed(&mut self, path: impl Into<String>) {
        self.committed.push(path.into());
    }

    /// Pass `result` through, turning an error into drift once anything has
    /// been committed.
    pub(crate) fn step<T>(&mut self, step: &str, path: impl Into<String>, result: RepoResult<T>) -> RepoResult<T> {
        match result {
            Ok(value) => {
                self.committed(path);
                Ok(value)
            }
            Err(source) if self.committed.is_empty() => Err(source),
            Err(source) => {
                error!(
                    operation = self.operation,
                    committed = ?self.committed,
                    failed_step = step,
                    error = %source,
                    "partial write drift"
                );
                Err(RepoError::PartialWriteDrift {
                    operation: self.operation.to_string(),
                    committed: self.committed.clone(),
                    failed_step: step.to_string(),
                    source: Box::new(source),
                })
            }
        }
    }
}
