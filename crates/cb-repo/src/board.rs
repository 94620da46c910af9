use cb_index::Index;
use cb_store::{BlobStore, RetryPolicy};

use crate::repository::Repository;

/// The operation surface collaborators call into.
///
/// Each operation is a sequence of independent document writes. Writes to
/// one document are serialized by the repository's retry loop; a failure
/// after an earlier write committed surfaces as
/// [`RepoError::PartialWriteDrift`](crate::RepoError::PartialWriteDrift).
///
/// Cheap to clone.
#[derive(Clone, Debug)]
pub struct Board {
    repo: Repository,
}

impl Board {
    pub fn new(store: BlobStore) -> Self {
        Self::with_retry(store, RetryPolicy::default())
    }

    pub fn with_retry(store: BlobStore, retry: RetryPolicy) -> Self {
        Self {
            repo: Repository::new(store, retry),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn index(&self) -> &Index {
        self.repo.index()
    }

    pub fn store(&self) -> &BlobStore {
        self.repo.store()
    }
}
