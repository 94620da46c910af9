use cb_model::{Comment, Post, User};
use cb_types::EntityKind;
use chrono::Utc;
use tracing::debug;

use crate::board::Board;
use crate::error::{RepoError, RepoResult};
use crate::repository::WriteTrail;

impl Board {
    // ---- Comment operations ----

    /// Add a comment to a post, at the top level or under `parent_id`.
    pub async fn add_comment(
        &self,
        post_id: &str,
        content: &str,
        author: &str,
        parent_id: Option<&str>,
    ) -> RepoResult<Comment> {
        if content.trim().is_empty() {
            return Err(RepoError::Validation("comment content is required".into()));
        }
        self.get_user(author).await?;

        let (_, comment) = self
            .repository()
            .modify(EntityKind::Post, post_id, &format!("{author} comments on {post_id}"), |post: &mut Post| {
                if post.deleted {
                    return Err(RepoError::Validation(format!("post {post_id} is deleted")));
                }
                Ok(post.add_comment(content, author, parent_id, Utc::now())?)
            })
            .await?;
        let mut trail = WriteTrail::new("add_comment");
        trail.committed(EntityKind::Post.direct_path(post_id));

        let credited = self
            .repository()
            .modify(EntityKind::User, author, &format!("Credit comment {} to {author}", comment.id), |u: &mut User| {
                u.record_comment(post_id, &comment.id, comment.created_at);
                Ok(())
            })
            .await;
        trail.step("author comment list", EntityKind::User.direct_path(author), credited)?;

        debug!(post_id, comment_id = %comment.id, parent_id, "comment added");
        Ok(comment)
    }

    /// The post's comment forest in nested form.
    pub async fn list_comments(&self, post_id: &str) -> RepoResult<Vec<Comment>> {
        Ok(self.get_post(post_id).await?.comments.to_nested())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_model::MAX_DEPTH;
    use cb_store::{BlobStore, InMemoryBlobStore, RetryPolicy};
    use std::sync::Arc;

    async fn board_with_post() -> (Board, String) {
        let board = Board::with_retry(BlobStore::new(Arc::new(InMemoryBlobStore::new())), RetryPolicy::immediate(3));
        board.create_user("alice", "hash", "alice@example.com").await.unwrap();
        board.create_user("bob", "hash", "bob@example.com").await.unwrap();
        board.create_community("gaming", "", "alice").await.unwrap();
        let post = board.create_post("gaming", "Thread", "", "alice").await.unwrap();
        (board, post.id)
    }

    #[tokio::test]
    async fn nested_comments_and_count() {
        let (board, post_id) = board_with_post().await;
        let top = board.add_comment(&post_id, "first", "bob", None).await.unwrap();
        let reply = board.add_comment(&post_id, "reply", "alice", Some(&top.id)).await.unwrap();
        board.add_comment(&post_id, "second", "alice", None).await.unwrap();
        assert_eq!(reply.parent_id.as_deref(), Some(top.id.as_str()));
        assert_eq!((reply.upvotes, reply.score), (1, 1));

        let forest = board.list_comments(&post_id).await.unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].replies[0].id, reply.id);
        assert_eq!(board.get_post(&post_id).await.unwrap().comment_count, 3);

        let bob = board.get_user("bob").await.unwrap();
        assert_eq!(bob.comments[0].comment_id, top.id);
    }

    #[tokio::test]
    async fn depth_bound_is_enforced() {
        let (board, post_id) = board_with_post().await;
        let mut parent = board.add_comment(&post_id, "depth 0", "bob", None).await.unwrap();
        for depth in 1..=MAX_DEPTH + 1 {
            parent = board
                .add_comment(&post_id, &format!("depth {depth}"), "bob", Some(&parent.id))
                .await
                .unwrap();
        }
        // `parent` now sits at depth 11.
        let err = board.add_comment(&post_id, "too deep", "bob", Some(&parent.id)).await.unwrap_err();
        assert!(matches!(err, RepoError::ParentNotFoundOrTooDeep { .. }));
        assert_eq!(board.get_post(&post_id).await.unwrap().comment_count, MAX_DEPTH as u64 + 2);
    }

    #[tokio::test]
    async fn unknown_parent_or_post() {
        let (board, post_id) = board_with_post().await;
        let err = board.add_comment(&post_id, "x", "bob", Some("nope")).await.unwrap_err();
        assert!(matches!(err, RepoError::ParentNotFoundOrTooDeep { .. }));
        assert!(board.add_comment("ghost", "x", "bob", None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn blank_comment_rejected() {
        let (board, post_id) = board_with_post().await;
        assert!(matches!(board.add_comment(&post_id, "  ", "bob", None).await, Err(RepoError::Validation(_))));
    }
}
