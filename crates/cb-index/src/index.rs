use cb_store::{BlobStore, Revision, RetryPolicy, StoreError};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::doc::IndexDoc;
use crate::error::{IndexError, IndexResult};

/// Path of the index document under the data root.
pub const INDEX_PATH: &str = "index.json";

/// Handle on the index document.
///
/// The index is created on first access and never deleted. Readers that
/// find it incomplete repair it in place; nothing here ever fails because
/// of what is (or is not) stored at [`INDEX_PATH`].
#[derive(Clone, Debug)]
pub struct Index {
    store: BlobStore,
    retry: RetryPolicy,
}

impl Index {
    pub fn new(store: BlobStore) -> Self {
        Self::with_retry(store, RetryPolicy::default())
    }

    pub fn with_retry(store: BlobStore, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Load the index together with its revision, creating or repairing it
    /// as needed.
    ///
    /// A missing index is created empty. If that create loses a race the
    /// winner's document is read instead. An incomplete index is repaired
    /// and written back with compare-and-swap.
    pub async fn load(&self) -> IndexResult<(IndexDoc, Revision)> {
        let attempts = self.retry.attempts();
        for attempt in 0..attempts {
            if attempt > 0 {
                self.retry.pause(attempt - 1).await;
            }

            let fetched = match self.store.get(INDEX_PATH).await {
                Ok(fetched) => fetched,
                Err(StoreError::NotFound { .. }) => {
                    let doc = IndexDoc::empty(Utc::now());
                    match self.store.put(INDEX_PATH, &doc, None, "Initialize index").await {
                        Ok(revision) => {
                            info!(revision = %revision.short_hex(), "index created");
                            return Ok((doc, revision));
                        }
                        Err(e) if e.is_conflict() => {
                            debug!("index created concurrently, re-reading");
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(e) => return Err(e.into()),
            };

            let (doc, repaired) = IndexDoc::repair(&fetched.content, Utc::now());
            if !repaired {
                return Ok((doc, fetched.revision));
            }

            match self
                .store
                .put(INDEX_PATH, &doc, Some(&fetched.revision), "Repair index")
                .await
            {
                Ok(revision) => {
                    warn!(revision = %revision.short_hex(), "index repaired");
                    return Ok((doc, revision));
                }
                Err(e) if e.is_conflict() || e.is_not_found() => {
                    debug!(attempt, "index changed during repair, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(IndexError::Contended { attempts })
    }

    /// Read the index without writing anything back.
    ///
    /// Missing or incomplete content is repaired in memory only.
    pub async fn snapshot(&self) -> IndexResult<IndexDoc> {
        match self.store.get(INDEX_PATH).await {
            Ok(fetched) => Ok(IndexDoc::repair(&fetched.content, Utc::now()).0),
            Err(StoreError::NotFound { .. }) => Ok(IndexDoc::empty(Utc::now())),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `doc` if the stored index is still at `revision`.
    pub async fn save(&self, doc: &mut IndexDoc, revision: &Revision, message: &str) -> IndexResult<Revision> {
        doc.last_updated = Utc::now();
        Ok(self.store.put(INDEX_PATH, &*doc, Some(revision), message).await?)
    }

    /// Load, mutate and save, re-running `mutate` on a fresh copy whenever
    /// another writer got there first.
    pub async fn update<R, F>(&self, message: &str, mut mutate: F) -> IndexResult<R>
    where
        F: FnMut(&mut IndexDoc) -> R,
    {
        let attempts = self.retry.attempts();
        for attempt in 0..attempts {
            if attempt > 0 {
                self.retry.pause(attempt - 1).await;
            }
            let (mut doc, revision) = self.load().await?;
            let out = mutate(&mut doc);
            match self.save(&mut doc, &revision, message).await {
                Ok(_) => return Ok(out),
                Err(e) if e.is_conflict() || is_not_found(&e) => {
                    debug!(attempt, message, "index update conflicted, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(IndexError::Contended { attempts })
    }
}

fn is_not_found(error: &IndexError) -> bool {
    matches!(error, IndexError::Store(e) if e.is_not_found())
}
