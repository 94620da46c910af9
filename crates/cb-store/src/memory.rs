use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use cb_types::Revision;
use tracing::debug;

use crate::entry::{Commit, Entry};
use crate::error::{StoreError, StoreResult};
use crate::traits::{check_expected, BlobBackend};
use crate::DEFAULT_INLINE_LIMIT;

#[derive(Default)]
struct State {
    entries: HashMap<String, (Revision, Bytes)>,
    /// Every payload ever written, keyed by revision. Never pruned: like the
    /// remote store's history, old objects stay addressable.
    objects: HashMap<Revision, Bytes>,
    commits: Vec<Commit>,
}

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Payloads larger than the inline limit
/// are withheld from [`BlobBackend::read_entry`] the way a remote contents
/// API truncates large files, so callers exercise the object fetch path.
pub struct InMemoryBlobStore {
    state: RwLock<State>,
    inline_limit: usize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::with_inline_limit(DEFAULT_INLINE_LIMIT)
    }

    /// Create a store that only inlines payloads up to `limit` bytes.
    pub fn with_inline_limit(limit: usize) -> Self {
        Self {
            state: RwLock::new(State::default()),
            inline_limit: limit,
        }
    }

    /// Number of paths currently stored.
    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The commit log, oldest first.
    pub fn commits(&self) -> Vec<Commit> {
        self.state.read().expect("lock poisoned").commits.clone()
    }

    /// Sorted list of all stored paths.
    pub fn paths(&self) -> Vec<String> {
        let state = self.state.read().expect("lock poisoned");
        let mut paths: Vec<String> = state.entries.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobBackend for InMemoryBlobStore {
    async fn read_entry(&self, path: &str) -> StoreResult<Option<Entry>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state.entries.get(path).map(|(revision, content)| Entry {
            revision: *revision,
            size: content.len() as u64,
            inline: (content.len() <= self.inline_limit).then(|| content.clone()),
        }))
    }

    async fn read_object(&self, revision: &Revision) -> StoreResult<Option<Bytes>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state.objects.get(revision).cloned())
    }

    async fn write_entry(
        &self,
        path: &str,
        content: Bytes,
        expected: Option<&Revision>,
        message: &str,
    ) -> StoreResult<Revision> {
        let mut state = self.state.write().expect("lock poisoned");
        let current = state.entries.get(path).map(|(rev, _)| *rev);
        check_expected(path, expected, current)?;

        let revision = Revision::of(&content);
        state.objects.entry(revision).or_insert_with(|| content.clone());
        state.entries.insert(path.to_string(), (revision, content));
        state.commits.push(Commit::new(message, path, Some(revision)));
        debug!(path, revision = %revision.short_hex(), "memory write");
        Ok(revision)
    }

    async fn delete_entry(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        let current = state.entries.get(path).map(|(rev, _)| *rev);
        if current.is_none() {
            return Err(StoreError::NotFound { path: path.to_string() });
        }
        check_expected(path, Some(expected), current)?;
        state.entries.remove(path);
        state.commits.push(Commit::new(message, path, None));
        Ok(())
    }

    async fn list_entries(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        let state = self.state.read().expect("lock poisoned");
        let mut paths: Vec<String> = state
            .entries
            .keys()
            .filter(|p| p.strip_prefix(&dir).is_some_and(|rest| !rest.contains('/')))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("paths", &self.len())
            .field("inline_limit", &self.inline_limit)
            .finish()
    }
}
