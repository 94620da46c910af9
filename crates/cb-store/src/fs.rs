use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use cb_types::Revision;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::entry::{Commit, Entry};
use crate::error::{StoreError, StoreResult};
use crate::paths::validate_path;
use crate::traits::{check_expected, BlobBackend};
use crate::DEFAULT_INLINE_LIMIT;

const OBJECTS_DIR: &str = ".objects";
const COMMIT_LOG: &str = ".commits.jsonl";

/// Directory-backed blob store.
///
/// Layout under the root:
///
/// - `<path>` -- the current payload of each stored path
/// - `.objects/ab/cd/<hex>` -- every payload ever written, by revision
/// - `.commits.jsonl` -- one JSON [`Commit`] per line
///
/// Compare-and-swap is enforced by a process-local write lock. Two processes
/// sharing one directory are not coordinated.
pub struct FsBlobStore {
    root: PathBuf,
    inline_limit: usize,
    write_lock: Mutex<()>,
}

async fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with_inline_limit(root, DEFAULT_INLINE_LIMIT).await
    }

    pub async fn open_with_inline_limit(root: impl Into<PathBuf>, limit: usize) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(OBJECTS_DIR)).await?;
        info!(path = %root.display(), "blob store opened");
        Ok(Self {
            root,
            inline_limit: limit,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, path: &str) -> StoreResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    /// Sharded object path: `.objects/ab/cd/<hex>`.
    fn object_path(&self, revision: &Revision) -> PathBuf {
        let hex = revision.to_hex();
        self.root
            .join(OBJECTS_DIR)
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(hex)
    }

    async fn current_revision(&self, file: &Path) -> StoreResult<Option<Revision>> {
        Ok(read_optional(file).await?.map(|data| Revision::of(&data)))
    }

    async fn append_commit(&self, commit: &Commit) -> StoreResult<()> {
        let mut line =
            serde_json::to_vec(commit).map_err(|e| StoreError::Serialization(e.to_string()))?;
        line.push(b'\n');
        let mut log = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(COMMIT_LOG))
            .await?;
        log.write_all(&line).await?;
        Ok(())
    }

    /// Read back the commit log, oldest first.
    pub async fn commits(&self) -> StoreResult<Vec<Commit>> {
        let Some(data) = read_optional(&self.root.join(COMMIT_LOG)).await? else {
            return Ok(Vec::new());
        };
        data.split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_slice(line).map_err(|e| StoreError::Serialization(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl BlobBackend for FsBlobStore {
    async fn read_entry(&self, path: &str) -> StoreResult<Option<Entry>> {
        let file = self.entry_path(path)?;
        Ok(read_optional(&file).await?.map(|data| {
            let size = data.len() as u64;
            Entry {
                revision: Revision::of(&data),
                size,
                inline: (data.len() <= self.inline_limit).then(|| Bytes::from(data)),
            }
        }))
    }

    async fn read_object(&self, revision: &Revision) -> StoreResult<Option<Bytes>> {
        Ok(read_optional(&self.object_path(revision)).await?.map(Bytes::from))
    }

    async fn write_entry(
        &self,
        path: &str,
        content: Bytes,
        expected: Option<&Revision>,
        message: &str,
    ) -> StoreResult<Revision> {
        let file = self.entry_path(path)?;
        let _guard = self.write_lock.lock().await;

        let current = self.current_revision(&file).await?;
        check_expected(path, expected, current)?;

        let revision = Revision::of(&content);
        let object = self.object_path(&revision);
        if fs::metadata(&object).await.is_err() {
            if let Some(parent) = object.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&object, &content).await?;
        }

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Write-then-rename so readers never observe a half-written payload.
        let staging = file.with_extension("json.tmp");
        fs::write(&staging, &content).await?;
        fs::rename(&staging, &file).await?;

        self.append_commit(&Commit::new(message, path, Some(revision))).await?;
        debug!(path, revision = %revision.short_hex(), "fs write");
        Ok(revision)
    }

    async fn delete_entry(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()> {
        let file = self.entry_path(path)?;
        let _guard = self.write_lock.lock().await;

        let current = self.current_revision(&file).await?;
        if current.is_none() {
            return Err(StoreError::NotFound { path: path.to_string() });
        }
        check_expected(path, Some(expected), current)?;
        fs::remove_file(&file).await?;
        self.append_commit(&Commit::new(message, path, None)).await?;
        Ok(())
    }

    async fn list_entries(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let prefix = prefix.trim_end_matches('/');
        let dir = self.entry_path(prefix)?;
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut paths = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || name.ends_with(".tmp") {
                continue;
            }
            paths.push(format!("{prefix}/{name}"));
        }
        paths.sort();
        Ok(paths)
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
            .field("inline_limit", &self.inline_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[tokio::test]
    async fn write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let rev = store
            .write_entry("users/alice.json", bytes("{\"a\":1}"), None, "create alice")
            .await
            .unwrap();
        let entry = store.read_entry("users/alice.json").await.unwrap().unwrap();
        assert_eq!(entry.revision, rev);
        assert_eq!(entry.inline.as_deref(), Some(&b"{\"a\":1}"[..]));
    }

    #[tokio::test]
    async fn cas_rules_match_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let r1 = store.write_entry("a.json", bytes("1"), None, "m").await.unwrap();
        assert!(store.write_entry("a.json", bytes("x"), None, "m").await.unwrap_err().is_conflict());
        let r2 = store.write_entry("a.json", bytes("2"), Some(&r1), "m").await.unwrap();
        assert!(store
            .write_entry("a.json", bytes("3"), Some(&r1), "m")
            .await
            .unwrap_err()
            .is_conflict());
        store.delete_entry("a.json", &r2, "rm").await.unwrap();
        assert!(store.read_entry("a.json").await.unwrap().is_none());
        assert!(store.delete_entry("a.json", &r2, "rm").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn large_payload_goes_through_object_area() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open_with_inline_limit(dir.path(), 8).await.unwrap();
        let rev = store
            .write_entry("posts/big.json", bytes("a very long payload"), None, "m")
            .await
            .unwrap();
        let entry = store.read_entry("posts/big.json").await.unwrap().unwrap();
        assert!(entry.inline.is_none());
        let full = store.read_object(&rev).await.unwrap().unwrap();
        assert_eq!(&full[..], b"a very long payload");
    }

    #[tokio::test]
    async fn commit_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsBlobStore::open(dir.path()).await.unwrap();
            store.write_entry("a.json", bytes("1"), None, "first").await.unwrap();
        }
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let commits = store.commits().await.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "first");
    }

    #[tokio::test]
    async fn listing_skips_reserved_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        store.write_entry("posts/a.json", bytes("1"), None, "m").await.unwrap();
        store.write_entry("posts/b.json", bytes("2"), None, "m").await.unwrap();
        assert_eq!(store.list_entries("posts").await.unwrap(), vec!["posts/a.json", "posts/b.json"]);
        assert!(store.list_entries("users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let err = store.read_entry("../escape.json").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
    }
}
