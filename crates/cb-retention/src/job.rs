use cb_index::Index;
use cb_model::Post;
use cb_repo::{DualPathResolver, RepoError};
use cb_store::{BlobStore, Revision, StoreError};
use cb_types::EntityKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::RetentionConfig;
use crate::error::{RetentionError, RetentionResult};

/// Most candidates deleted by one sweep.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Outcome of one sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionReport {
    /// Aged posts fetched to check for activity.
    pub scanned: usize,
    /// Aged posts without comments.
    pub candidates: usize,
    /// Ids whose documents this sweep deleted.
    pub deleted: Vec<String>,
    /// Index entries dropped because the document was already gone.
    pub pruned: Vec<String>,
    /// Candidates left alone after a failed fetch, a lost race or a
    /// transport error. Posts stored but unreadable count here too.
    pub skipped: usize,
}

impl RetentionReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

struct Candidate {
    id: String,
    path: String,
    revision: Revision,
}

/// One bounded retention sweep over the index.
#[derive(Clone, Debug)]
pub struct RetentionJob {
    store: BlobStore,
    index: Index,
    resolver: DualPathResolver,
    batch_size: usize,
}

impl RetentionJob {
    pub fn new(store: BlobStore, index: Index) -> Self {
        Self {
            resolver: DualPathResolver::new(store.clone()),
            store,
            index,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn run(&self, config: &RetentionConfig) -> RetentionResult<RetentionReport> {
        self.run_at(config, Utc::now()).await
    }

    /// Sweep as if the current time were `now`.
    ///
    /// Aged posts are visited oldest first and each is fetched once. Up to
    /// `batch_size` comment-free posts are deleted with compare-and-swap on
    /// the fetched revision, so a post that changed since the fetch
    /// survives. All removed ids leave the index in a single update.
    pub async fn run_at(&self, config: &RetentionConfig, now: DateTime<Utc>) -> RetentionResult<RetentionReport> {
        config.validate()?;
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(config.retention_days)))
            .ok_or_else(|| {
                RetentionError::InvalidConfig(format!(
                    "retentionDays {} reaches before the earliest representable time",
                    config.retention_days
                ))
            })?;
        let snapshot = self.index.snapshot().await?;

        let mut aged: Vec<(String, DateTime<Utc>, String)> = snapshot
            .posts
            .iter()
            .filter(|(_, entry)| entry.created_at < cutoff)
            .map(|(id, entry)| (id.clone(), entry.created_at, entry.path.clone()))
            .collect();
        aged.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut report = RetentionReport::default();
        let mut chosen = Vec::new();
        for (id, _, indexed_path) in aged {
            if chosen.len() >= self.batch_size {
                break;
            }
            report.scanned += 1;
            match self.resolver.resolve::<Post>(EntityKind::Post, &id, &self.index).await {
                Ok(found) => {
                    if found.value.comments.is_empty() && found.value.comment_count == 0 {
                        chosen.push(Candidate {
                            id,
                            path: found.path,
                            revision: found.revision,
                        });
                    }
                }
                Err(RepoError::NotFound { .. }) => match self.is_absent(&id, &indexed_path).await {
                    Ok(true) => {
                        debug!(post_id = %id, "indexed post already gone");
                        report.pruned.push(id);
                    }
                    Ok(false) => {
                        warn!(post_id = %id, "post stored but unreadable, keeping it");
                        report.skipped += 1;
                    }
                    Err(error) => {
                        warn!(post_id = %id, %error, "retention presence check failed, skipping");
                        report.skipped += 1;
                    }
                },
                Err(error) => {
                    warn!(post_id = %id, %error, "retention fetch failed, skipping");
                    report.skipped += 1;
                }
            }
        }
        report.candidates = chosen.len();

        for candidate in chosen {
            let message = format!("Retention: delete post {}", candidate.id);
            match self.store.delete(&candidate.path, &candidate.revision, &message).await {
                Ok(()) => report.deleted.push(candidate.id),
                Err(StoreError::NotFound { .. }) => {
                    debug!(post_id = %candidate.id, "deleted concurrently");
                    report.pruned.push(candidate.id);
                }
                Err(StoreError::Conflict { .. }) => {
                    info!(post_id = %candidate.id, "post changed since fetch, keeping it");
                    report.skipped += 1;
                }
                Err(error) => {
                    warn!(post_id = %candidate.id, %error, "retention delete failed, skipping");
                    report.skipped += 1;
                }
            }
        }

        if !report.deleted.is_empty() || !report.pruned.is_empty() {
            let removed: Vec<&String> = report.deleted.iter().chain(report.pruned.iter()).collect();
            let message = format!("Retention: unindex {} posts", removed.len());
            if let Err(e) = self
                .index
                .update(&message, |doc| {
                    for id in &removed {
                        doc.posts.remove(id.as_str());
                    }
                })
                .await
            {
                error!(deleted = ?report.deleted, error = %e, "posts deleted but index not updated");
                return Err(e.into());
            }
        }

        info!(
            scanned = report.scanned,
            candidates = report.candidates,
            deleted = report.deleted_count(),
            pruned = report.pruned.len(),
            skipped = report.skipped,
            "retention sweep finished"
        );
        Ok(report)
    }

    /// True only if nothing at all is stored at the post's direct path or
    /// at the path the index recorded. Content that exists but does not
    /// decode still counts as present.
    async fn is_absent(&self, id: &str, indexed_path: &str) -> RetentionResult<bool> {
        let direct = EntityKind::Post.direct_path(id);
        for path in [direct.as_str(), indexed_path] {
            match self.store.get(path).await {
                Ok(_) => return Ok(false),
                Err(StoreError::NotFound { .. } | StoreError::InvalidPath { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cb_model::Post;
    use cb_repo::Board;
    use cb_store::{BlobBackend, Entry, InMemoryBlobStore, RetryPolicy, StoreResult};
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Memory backend with per-path delete behaviour: paths in `edited`
    /// get rewritten by another writer just before the delete lands, paths
    /// in `unreachable` fail with a transport error.
    #[derive(Default)]
    struct Scripted {
        inner: InMemoryBlobStore,
        edited: Mutex<HashSet<String>>,
        unreachable: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl BlobBackend for Scripted {
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
            self.inner.write_entry(path, content, expected, message).await
        }

        async fn delete_entry(&self, path: &str, expected: &Revision, message: &str) -> StoreResult<()> {
            if self.unreachable.lock().expect("lock poisoned").contains(path) {
                return Err(StoreError::Backend(format!("{path}: connection reset")));
            }
            let edit = self.edited.lock().expect("lock poisoned").remove(path);
            if edit {
                if let Some(current) = self.inner.read_entry(path).await? {
                    let raw = current.inline.unwrap_or_default();
                    let mut doc: Value =
                        serde_json::from_slice(&raw).map_err(|e| StoreError::Backend(e.to_string()))?;
                    doc["content"] = Value::from("edited while the sweep ran");
                    let body = serde_json::to_vec(&doc).map_err(|e| StoreError::Backend(e.to_string()))?;
                    self.inner
                        .write_entry(path, Bytes::from(body), Some(&current.revision), "concurrent edit")
                        .await?;
                }
            }
            self.inner.delete_entry(path, expected, message).await
        }

        async fn list_entries(&self, prefix: &str) -> StoreResult<Vec<String>> {
            self.inner.list_entries(prefix).await
        }
    }

    async fn board_on(store: BlobStore) -> Board {
        let board = Board::with_retry(store, RetryPolicy::immediate(3));
        board.create_user("alice", "hash", "alice@example.com").await.unwrap();
        board.create_user("bob", "hash", "bob@example.com").await.unwrap();
        board.create_community("gaming", "", "alice").await.unwrap();
        board
    }

    async fn board() -> Board {
        board_on(BlobStore::new(Arc::new(InMemoryBlobStore::new()))).await
    }

    async fn scripted_board() -> (Board, Arc<Scripted>) {
        let backend = Arc::new(Scripted::default());
        (board_on(BlobStore::new(backend.clone())).await, backend)
    }

    /// Create a post and move its creation time `days` into the past, both
    /// in the document and in the index.
    async fn aged_post(board: &Board, title: &str, days: i64) -> String {
        let post = board.create_post("gaming", title, "", "alice").await.unwrap();
        let created = Utc::now() - Duration::days(days);
        board
            .repository()
            .modify(EntityKind::Post, &post.id, "backdate", |p: &mut Post| {
                p.created_at = created;
                Ok(())
            })
            .await
            .unwrap();
        board
            .index()
            .update("backdate", |doc| {
                if let Some(entry) = doc.posts.get_mut(&post.id) {
                    entry.created_at = created;
                }
            })
            .await
            .unwrap();
        post.id
    }

    fn job(board: &Board) -> RetentionJob {
        RetentionJob::new(board.store().clone(), board.index().clone())
    }

    #[tokio::test]
    async fn old_quiet_post_is_deleted_and_commented_one_kept() {
        let board = board().await;
        let quiet = aged_post(&board, "quiet", 30).await;
        let busy = aged_post(&board, "busy", 30).await;
        board.add_comment(&busy, "still here", "bob", None).await.unwrap();
        let config = RetentionConfig { retention_days: 20 };

        let report = job(&board).run(&config).await.unwrap();
        assert_eq!(report.deleted, vec![quiet.clone()]);
        assert_eq!(report.candidates, 1);

        assert!(board.get_post(&quiet).await.unwrap_err().is_not_found());
        assert!(board.get_post(&busy).await.is_ok());
        let doc = board.index().snapshot().await.unwrap();
        assert!(!doc.posts.contains_key(&quiet));
        assert!(doc.posts.contains_key(&busy));

        // Post lists keep the dangling id.
        assert!(board.get_community("gaming").await.unwrap().posts.contains(&quiet));

        let again = job(&board).run(&config).await.unwrap();
        assert!(again.deleted.is_empty());
        assert_eq!(again.candidates, 0);
    }

    #[tokio::test]
    async fn young_posts_survive() {
        let board = board().await;
        let recent = aged_post(&board, "recent", 10).await;
        let report = job(&board).run(&RetentionConfig { retention_days: 20 }).await.unwrap();
        assert_eq!(report.scanned, 0);
        assert!(board.get_post(&recent).await.is_ok());
    }

    #[tokio::test]
    async fn batches_are_bounded_oldest_first() {
        let board = board().await;
        let mut ids = Vec::new();
        for days in (40..47).rev() {
            ids.push(aged_post(&board, &format!("p{days}"), days).await);
        }
        let config = RetentionConfig { retention_days: 20 };

        let first = job(&board).run(&config).await.unwrap();
        assert_eq!(first.deleted_count(), DEFAULT_BATCH_SIZE);
        assert_eq!(first.deleted, ids[..DEFAULT_BATCH_SIZE].to_vec());

        let second = job(&board).run(&config).await.unwrap();
        assert_eq!(second.deleted_count(), 2);
        assert!(board.index().snapshot().await.unwrap().posts.is_empty());
    }

    #[tokio::test]
    async fn stale_index_entries_are_pruned() {
        let board = board().await;
        let id = aged_post(&board, "vanished", 30).await;
        let path = EntityKind::Post.direct_path(&id);
        let rev = board.store().get(&path).await.unwrap().revision;
        board.store().delete(&path, &rev, "out of band").await.unwrap();

        let report = job(&board).run(&RetentionConfig { retention_days: 20 }).await.unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(report.pruned, vec![id.clone()]);
        assert!(!board.index().snapshot().await.unwrap().posts.contains_key(&id));
    }

    #[tokio::test]
    async fn unreadable_post_is_kept_indexed() {
        let board = board().await;
        let id = aged_post(&board, "drifted", 30).await;
        let path = EntityKind::Post.direct_path(&id);
        let rev = board.store().get(&path).await.unwrap().revision;
        board
            .store()
            .put(&path, &json!({"id": id, "extra": "schema drift"}), Some(&rev), "rewrite")
            .await
            .unwrap();

        let report = job(&board).run(&RetentionConfig { retention_days: 20 }).await.unwrap();
        assert!(report.pruned.is_empty());
        assert!(report.deleted.is_empty());
        assert_eq!(report.skipped, 1);
        assert!(board.index().snapshot().await.unwrap().posts.contains_key(&id));
        assert!(board.store().get(&path).await.is_ok());
    }

    #[tokio::test]
    async fn oversized_retention_is_an_error() {
        let board = board().await;
        aged_post(&board, "old", 30).await;
        let err = job(&board)
            .run(&RetentionConfig { retention_days: u32::MAX })
            .await
            .unwrap_err();
        assert!(matches!(err, RetentionError::InvalidConfig(_)));

        // Accepted by validation but still before the earliest representable time.
        let err = job(&board)
            .run_at(&RetentionConfig { retention_days: 20 }, DateTime::<Utc>::MIN_UTC)
            .await
            .unwrap_err();
        assert!(matches!(err, RetentionError::InvalidConfig(_)));
        assert_eq!(board.index().snapshot().await.unwrap().posts.len(), 1);
    }

    #[tokio::test]
    async fn post_edited_during_sweep_survives() {
        let (board, backend) = scripted_board().await;
        let id = aged_post(&board, "edited", 30).await;
        let path = EntityKind::Post.direct_path(&id);
        backend.edited.lock().unwrap().insert(path.clone());

        let report = job(&board).run(&RetentionConfig { retention_days: 20 }).await.unwrap();
        assert_eq!(report.candidates, 1);
        assert!(report.deleted.is_empty());
        assert!(report.pruned.is_empty());
        assert_eq!(report.skipped, 1);

        let post = board.get_post(&id).await.unwrap();
        assert_eq!(post.content, "edited while the sweep ran");
        assert!(board.index().snapshot().await.unwrap().posts.contains_key(&id));
    }

    #[tokio::test]
    async fn transport_error_skips_only_that_post() {
        let (board, backend) = scripted_board().await;
        let first = aged_post(&board, "first", 33).await;
        let flaky = aged_post(&board, "flaky", 32).await;
        let last = aged_post(&board, "last", 31).await;
        backend
            .unreachable
            .lock()
            .unwrap()
            .insert(EntityKind::Post.direct_path(&flaky));

        let report = job(&board).run(&RetentionConfig { retention_days: 20 }).await.unwrap();
        assert_eq!(report.candidates, 3);
        assert_eq!(report.deleted, vec![first.clone(), last.clone()]);
        assert_eq!(report.skipped, 1);

        let doc = board.index().snapshot().await.unwrap();
        assert!(doc.posts.contains_key(&flaky));
        assert!(!doc.posts.contains_key(&first));
        assert!(!doc.posts.contains_key(&last));
        assert!(board.get_post(&flaky).await.is_ok());
    }

    #[tokio::test]
    async fn vote_on_swept_post_is_not_found() {
        let board = board().await;
        let id = aged_post(&board, "gone", 30).await;
        let report = job(&board).run(&RetentionConfig { retention_days: 20 }).await.unwrap();
        assert_eq!(report.deleted, vec![id.clone()]);

        assert!(board.vote(&id, "bob", 1).await.unwrap_err().is_not_found());
        assert!(board.toggle_vote(&id, "bob", -1).await.unwrap_err().is_not_found());
    }
}
