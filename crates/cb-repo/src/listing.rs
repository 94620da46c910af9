use std::fmt;
use std::str::FromStr;

use cb_index::PostRef;
use cb_model::Post;
use cb_types::sanitize_community_name;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::error::{RepoError, RepoResult};

pub const DEFAULT_LIMIT: usize = 25;
pub const MAX_LIMIT: usize = 100;
/// Most recent posts in scope that `hot` and `top` rank. Older posts fall
/// out of those listings entirely.
pub const RANK_WINDOW: usize = 500;

/// Which posts a listing draws from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListScope {
    All,
    Community(String),
    User(String),
}

impl ListScope {
    pub fn community(name: &str) -> Self {
        Self::Community(sanitize_community_name(name))
    }

    pub fn user(username: &str) -> Self {
        Self::User(username.to_string())
    }

    fn matches(&self, entry: &PostRef) -> bool {
        match self {
            Self::All => true,
            Self::Community(name) => entry.community == *name,
            Self::User(username) => entry.author == *username,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    New,
    Hot,
    Top,
}

impl FromStr for SortOrder {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "hot" => Ok(Self::Hot),
            "top" => Ok(Self::Top),
            other => Err(RepoError::Validation(format!("unknown sort order: {other}"))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::New => "new",
            Self::Hot => "hot",
            Self::Top => "top",
        })
    }
}

impl Board {
    // ---- Listing ----

    /// List live posts in `scope`.
    ///
    /// Candidates come from the index; each is then fetched, and posts that
    /// no longer exist or are soft-deleted are skipped. `limit` of zero means
    /// [`DEFAULT_LIMIT`]; larger values are capped at [`MAX_LIMIT`].
    ///
    /// `new` stops fetching once `limit` live posts are found. `hot` and
    /// `top` must fetch every candidate before ranking, so they only consider
    /// the newest [`RANK_WINDOW`] index entries in scope.
    pub async fn list_posts(&self, scope: &ListScope, sort: SortOrder, limit: usize) -> RepoResult<Vec<Post>> {
        self.list_posts_within(scope, sort, limit, RANK_WINDOW).await
    }

    async fn list_posts_within(
        &self,
        scope: &ListScope,
        sort: SortOrder,
        limit: usize,
        window: usize,
    ) -> RepoResult<Vec<Post>> {
        let limit = match limit {
            0 => DEFAULT_LIMIT,
            n => n.min(MAX_LIMIT),
        };
        let snapshot = self.index().snapshot().await?;
        let candidates: Vec<String> = snapshot
            .posts_newest_first()
            .into_iter()
            .filter(|(_, entry)| scope.matches(entry))
            .map(|(id, _)| id.clone())
            .take(if sort == SortOrder::New { usize::MAX } else { window })
            .collect();

        let mut posts = Vec::new();
        for id in candidates {
            // Newest-first is already the index order.
            if sort == SortOrder::New && posts.len() >= limit {
                break;
            }
            match self.get_post(&id).await {
                Ok(post) if !post.deleted => posts.push(post),
                Ok(_) => {}
                Err(e) if e.is_not_found() => debug!(post_id = %id, "indexed post is gone"),
                Err(e) => return Err(e),
            }
        }

        match sort {
            SortOrder::New => {}
            SortOrder::Hot => posts.sort_by(|a, b| b.hot_rank().total_cmp(&a.hot_rank())),
            SortOrder::Top => posts.sort_by(|a, b| {
                b.votes
                    .score()
                    .cmp(&a.votes.score())
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }
        posts.truncate(limit);
        Ok(posts)
    }
}
