use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cb_types::{new_post_id, post_slug};

use crate::error::ModelResult;
use crate::forest::{Comment, CommentForest};
use crate::vote::{Vote, VoteLedger, VoteTally};

/// Marker written over the fields of a soft-deleted post.
pub const TOMBSTONE: &str = "[deleted]";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Text,
    Link,
    Image,
}

/// A stored post document, including its votes and comments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: PostKind,
    pub author: String,
    pub community: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub votes: VoteLedger,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub comments: CommentForest,
    #[serde(default)]
    pub deleted: bool,
}

impl Post {
    pub fn new(
        community: &str,
        title: &str,
        content: &str,
        kind: PostKind,
        author: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let id = new_post_id();
        Self {
            slug: post_slug(title, &id),
            id,
            title: title.to_string(),
            content: content.to_string(),
            kind,
            author: author.to_string(),
            community: community.to_string(),
            created_at: now,
            votes: VoteLedger::with_author_upvote(author),
            comment_count: 0,
            comments: CommentForest::new(),
            deleted: false,
        }
    }

    /// Add a comment at the top level or as a reply.
    pub fn add_comment(
        &mut self,
        content: &str,
        author: &str,
        parent_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> ModelResult<Comment> {
        let comment = Comment::new(content, author, parent_id, now);
        let inserted = self.comments.insert(comment, parent_id)?.clone();
        self.comment_count += 1;
        Ok(inserted)
    }

    pub fn vote(&mut self, username: &str, vote: Vote) -> VoteTally {
        self.votes.cast(username, vote)
    }

    pub fn toggle_vote(&mut self, username: &str, vote: Vote) -> VoteTally {
        let author = self.author.clone();
        self.votes.toggle(username, vote, &author)
    }

    /// Overwrite the visible fields with [`TOMBSTONE`]. The document, its
    /// votes and its comments stay.
    pub fn soft_delete(&mut self) {
        self.title = TOMBSTONE.to_string();
        self.content = TOMBSTONE.to_string();
        self.author = TOMBSTONE.to_string();
        self.deleted = true;
    }

    /// Ranking used by the `hot` listing: log-scaled score plus an age term,
    /// so newer posts outrank older ones of similar score.
    pub fn hot_rank(&self) -> f64 {
        let score = self.votes.score();
        let order = (score.unsigned_abs().max(1) as f64).log10();
        let sign = score.signum() as f64;
        let seconds = self.created_at.timestamp() as f64;
        sign * order + seconds / 45_000.0
    }
}
