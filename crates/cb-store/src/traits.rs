use async_trait::async_trait;
use bytes::Bytes;
use cb_types::Revision;

use crate::entry::Entry;
use crate::error::StoreResult;

/// Raw transport to a versioned, commit-based blob store.
///
/// Implementations must satisfy:
/// - `write_entry` with `expected == None` creates; it fails with
///   [`StoreError::Conflict`](crate::StoreError::Conflict) if the path exists.
/// - `write_entry` with `Some(rev)` succeeds only if the current revision is
///   `rev`; `NotFound` if nothing is stored, `Conflict` otherwise.
/// - `delete_entry` is compare-and-swap on the same terms.
/// - Every object ever written stays readable by revision through
///   `read_object`.
/// - Paths handed in are already validated relative paths.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Primary read. Returns `Ok(None)` if nothing is stored at `path`.
    async fn read_entry(&self, path: &str) -> StoreResult<Option<Entry>>;

    /// Secondary full-content read keyed by object identity.
    async fn read_object(&self, revision: &Revision) -> StoreResult<Option<Bytes>>;

    /// Create or compare-and-swap a path, recording a commit.
    async fn write_entry(
        &self,
        path: &str,
        content: Bytes,
        expected: Option<&Revision>,
        message: &str,
    ) -> StoreResult<Revision>;

    /// Compare-and-swap delete, recording a commit.
    async fn delete_entry(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()>;

    /// Paths directly under the directory `prefix`, sorted.
    async fn list_entries(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Shared compare-and-swap rule for backends that check revisions locally.
pub(crate) fn check_expected(
    path: &str,
    expected: Option<&Revision>,
    current: Option<Revision>,
) -> StoreResult<()> {
    use crate::error::StoreError;

    match (expected, current) {
        (None, None) => Ok(()),
        (Some(exp), Some(cur)) if *exp == cur => Ok(()),
        (Some(_), None) => Err(StoreError::NotFound { path: path.to_string() }),
        (expected, actual) => Err(StoreError::Conflict {
            path: path.to_string(),
            expected: expected.copied(),
            actual,
        }),
    }
}
