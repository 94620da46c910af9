//! Two-step document lookup: the conventional path first, then whatever
//! path the index recorded.

use async_trait::async_trait;
use cb_index::Index;
use cb_store::{BlobStore, Revision, StoreError};
use cb_types::EntityKind;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{RepoError, RepoResult};

/// Source of stored paths for keys the direct path could not serve.
#[async_trait]
pub trait PathLookup: Send + Sync {
    async fn lookup(&self, kind: EntityKind, key: &str) -> RepoResult<Option<String>>;
}

#[async_trait]
impl PathLookup for Index {
    async fn lookup(&self, kind: EntityKind, key: &str) -> RepoResult<Option<String>> {
        let doc = self.snapshot().await?;
        Ok(doc.path_of(kind, key).map(str::to_string))
    }
}

/// A decoded document with the revision and path it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub revision: Revision,
    pub path: String,
}

/// Read-only resolver. Never writes, never touches the index on a direct hit.
#[derive(Clone, Debug)]
pub struct DualPathResolver {
    store: BlobStore,
}

impl DualPathResolver {
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    pub async fn resolve<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        key: &str,
        fallback: &dyn PathLookup,
    ) -> RepoResult<Resolved<T>> {
        if let Some(found) = self.resolve_direct(kind, key).await? {
            return Ok(found);
        }
        debug!(%kind, key, "direct path missed, consulting index");
        match self.resolve_indexed(kind, key, fallback).await? {
            Some(found) => Ok(found),
            None => Err(RepoError::not_found(kind, key)),
        }
    }

    /// Only the conventional `<dir>/<key>.json` location.
    pub async fn resolve_direct<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        key: &str,
    ) -> RepoResult<Option<Resolved<T>>> {
        self.fetch(&kind.direct_path(key)).await
    }

    /// Only the location recorded by `fallback`.
    pub async fn resolve_indexed<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        key: &str,
        fallback: &dyn PathLookup,
    ) -> RepoResult<Option<Resolved<T>>> {
        match fallback.lookup(kind, key).await? {
            Some(path) => self.fetch(&path).await,
            None => Ok(None),
        }
    }

    /// `None` for anything that cannot serve as the document: absent, empty,
    /// undecodable or an invalid path.
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> RepoResult<Option<Resolved<T>>> {
        let fetched = match self.store.get(path).await {
            Ok(fetched) => fetched,
            Err(StoreError::NotFound { .. }) => return Ok(None),
            Err(StoreError::InvalidPath { path, reason }) => {
                debug!(%path, %reason, "unusable path");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if fetched.is_empty() {
            return Ok(None);
        }
        match fetched.decode::<T>() {
            Ok(value) => Ok(Some(Resolved {
                value,
                revision: fetched.revision,
                path: path.to_string(),
            })),
            Err(error) => {
                warn!(path, %error, "document does not decode");
                Ok(None)
            }
        }
    }
}
