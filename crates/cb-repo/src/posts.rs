use std::collections::BTreeSet;

use cb_index::{PostRef, INDEX_PATH};
use cb_model::{Community, Post, PostKind, User, Vote, VoteTally, TOMBSTONE};
use cb_types::{sanitize_community_name, Actor, EntityKind};
use chrono::Utc;
use tracing::info;

use crate::board::Board;
use crate::error::{RepoError, RepoResult};
use crate::repository::WriteTrail;

/// Longest accepted post title, in characters.
pub const TITLE_MAX: usize = 300;

impl Board {
    // ---- Post operations ----

    pub async fn create_post(&self, community: &str, title: &str, content: &str, author: &str) -> RepoResult<Post> {
        self.create_post_with_kind(community, title, content, PostKind::Text, author).await
    }

    /// Create a post, then record it in the index, the community and the
    /// author's post list, in that order.
    pub async fn create_post_with_kind(
        &self,
        community: &str,
        title: &str,
        content: &str,
        kind: PostKind,
        author: &str,
    ) -> RepoResult<Post> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RepoError::Validation("title is required".into()));
        }
        if title.chars().count() > TITLE_MAX {
            return Err(RepoError::Validation(format!("title is longer than {TITLE_MAX} characters")));
        }
        let community = self.get_community(community).await?;
        self.get_user(author).await?;

        let post = Post::new(&community.name, title, content, kind, author, Utc::now());
        let mut trail = WriteTrail::new("create_post");
        let (path, _) = self
            .repository()
            .create(EntityKind::Post, &post.id, &post, &format!("Create post {}", post.slug))
            .await?;
        trail.committed(path.clone());

        let entry = PostRef {
            path,
            created_at: post.created_at,
            community: post.community.clone(),
            author: post.author.clone(),
            title: post.title.clone(),
        };
        let indexed = self
            .index()
            .update(&format!("Index post {}", post.id), |doc| {
                doc.posts.insert(post.id.clone(), entry.clone());
            })
            .await
            .map_err(RepoError::from);
        trail.step("index update", INDEX_PATH, indexed)?;

        let listed = self
            .repository()
            .modify(
                EntityKind::Community,
                &community.name,
                &format!("List post {} in {}", post.id, community.name),
                |c: &mut Community| {
                    c.record_post(&post.id);
                    Ok(())
                },
            )
            .await;
        trail.step("community post list", EntityKind::Community.direct_path(&community.name), listed)?;

        let credited = self
            .repository()
            .modify(EntityKind::User, author, &format!("Credit post {} to {author}", post.id), |u: &mut User| {
                u.record_post(&post.id);
                Ok(())
            })
            .await;
        trail.step("author post list", EntityKind::User.direct_path(author), credited)?;

        info!(post_id = %post.id, community = %post.community, author, "post created");
        Ok(post)
    }

    pub async fn get_post(&self, id: &str) -> RepoResult<Post> {
        Ok(self.repository().read::<Post>(EntityKind::Post, id).await?.value)
    }

    /// Tombstone a post. Allowed for its author, a moderator of its
    /// community or an admin. Deleting an already deleted post succeeds.
    pub async fn soft_delete_post(&self, id: &str, actor: &Actor) -> RepoResult<()> {
        let post = self.get_post(id).await?;
        let moderators = match self.get_community(&post.community).await {
            Ok(community) => community.moderators,
            Err(e) if e.is_not_found() => BTreeSet::new(),
            Err(e) => return Err(e),
        };

        let (_, changed) = self
            .repository()
            .modify(EntityKind::Post, id, &format!("Delete post {id}"), |p: &mut Post| {
                if p.deleted {
                    return Ok(false);
                }
                if !(actor.is_admin || actor.is(&p.author) || moderators.contains(&actor.name)) {
                    return Err(RepoError::denied(&actor.name, format!("delete post {id}")));
                }
                p.soft_delete();
                Ok(true)
            })
            .await?;
        if !changed {
            return Ok(());
        }

        let mut trail = WriteTrail::new("soft_delete_post");
        trail.committed(EntityKind::Post.direct_path(id));
        let indexed = self
            .index()
            .update(&format!("Tombstone post {id}"), |doc| {
                if let Some(entry) = doc.posts.get_mut(id) {
                    entry.title = TOMBSTONE.to_string();
                    entry.author = TOMBSTONE.to_string();
                }
            })
            .await
            .map_err(RepoError::from);
        trail.step("index tombstone", INDEX_PATH, indexed)?;

        info!(post_id = id, actor = %actor.name, "post deleted");
        Ok(())
    }

    // ---- Vote operations ----

    /// Set `username`'s vote on a post to `value` (`-1`, `0` or `1`).
    pub async fn vote(&self, post_id: &str, username: &str, value: i64) -> RepoResult<VoteTally> {
        let vote = Vote::from_value(value)?;
        self.get_user(username).await?;
        let (_, tally) = self
            .repository()
            .modify(EntityKind::Post, post_id, &format!("{username} votes {value} on {post_id}"), |p: &mut Post| {
                Ok(p.vote(username, vote))
            })
            .await?;
        Ok(tally)
    }

    /// Client-style vote: repeating the current vote retracts it.
    pub async fn toggle_vote(&self, post_id: &str, username: &str, value: i64) -> RepoResult<VoteTally> {
        let vote = Vote::from_value(value)?;
        self.get_user(username).await?;
        let (_, tally) = self
            .repository()
            .modify(EntityKind::Post, post_id, &format!("{username} toggles {value} on {post_id}"), |p: &mut Post| {
                Ok(p.toggle_vote(username, vote))
            })
            .await?;
        Ok(tally)
    }
}
