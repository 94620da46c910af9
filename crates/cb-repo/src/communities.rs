use cb_index::{CommunityRef, INDEX_PATH};
use cb_model::{Community, CommunityUpdate, User};
use cb_types::{sanitize_community_name, validate_community_name, Actor, EntityKind};
use chrono::Utc;
use tracing::{debug, info};

use crate::board::Board;
use crate::error::{RepoError, RepoResult};
use crate::repository::WriteTrail;

impl Board {
    // ---- Community operations ----

    /// Create a community. `name` is sanitized first; the creator becomes
    /// its first member and moderator.
    pub async fn create_community(&self, name: &str, description: &str, creator: &str) -> RepoResult<Community> {
        let key = sanitize_community_name(name);
        validate_community_name(&key)?;
        self.get_user(creator).await?;
        if self.index().snapshot().await?.contains(EntityKind::Community, &key) {
            return Err(RepoError::AlreadyExists {
                kind: EntityKind::Community,
                key,
            });
        }

        let community = Community::new(&key, name, description, creator, Utc::now());
        let mut trail = WriteTrail::new("create_community");
        let (path, _) = self
            .repository()
            .create(EntityKind::Community, &key, &community, &format!("Create community {key}"))
            .await?;
        trail.committed(path.clone());

        let entry = CommunityRef {
            path,
            created_at: community.created_at,
            icon_url: None,
            member_count: community.member_count,
        };
        let indexed = self
            .index()
            .update(&format!("Index community {key}"), |doc| {
                doc.communities.insert(key.clone(), entry.clone());
            })
            .await
            .map_err(RepoError::from);
        trail.step("index update", INDEX_PATH, indexed)?;

        let joined = self
            .repository()
            .modify(EntityKind::User, creator, &format!("{creator} joins {key}"), |user: &mut User| {
                user.join(&key);
                Ok(())
            })
            .await;
        trail.step("creator membership", EntityKind::User.direct_path(creator), joined)?;

        info!(community = %key, creator, "community created");
        Ok(community)
    }

    pub async fn get_community(&self, name: &str) -> RepoResult<Community> {
        let key = sanitize_community_name(name);
        Ok(self
            .repository()
            .read::<Community>(EntityKind::Community, &key)
            .await?
            .value)
    }

    /// Moderator or admin edit of a community's presentation.
    pub async fn update_community(&self, name: &str, update: &CommunityUpdate, actor: &Actor) -> RepoResult<Community> {
        let key = sanitize_community_name(name);
        let (community, ()) = self
            .repository()
            .modify(EntityKind::Community, &key, &format!("Update community {key}"), |c: &mut Community| {
                if !(actor.is_admin || c.is_moderator(&actor.name)) {
                    return Err(RepoError::denied(&actor.name, format!("update community {key}")));
                }
                c.apply_update(update);
                Ok(())
            })
            .await?;

        if update.icon_url.is_some() {
            let mut trail = WriteTrail::new("update_community");
            trail.committed(EntityKind::Community.direct_path(&key));
            let icon = community.icon_url.clone();
            let indexed = self
                .index()
                .update(&format!("Refresh icon of {key}"), |doc| {
                    if let Some(entry) = doc.communities.get_mut(&key) {
                        entry.icon_url = icon.clone();
                    }
                })
                .await
                .map_err(RepoError::from);
            trail.step("index icon refresh", INDEX_PATH, indexed)?;
        }
        Ok(community)
    }

    /// Add `username` to the community. Returns the new member count.
    pub async fn join_community(&self, name: &str, username: &str) -> RepoResult<u64> {
        self.change_membership(name, username, true).await
    }

    /// Remove `username` from the community. The creator cannot leave.
    pub async fn leave_community(&self, name: &str, username: &str) -> RepoResult<u64> {
        self.change_membership(name, username, false).await
    }

    async fn change_membership(&self, name: &str, username: &str, join: bool) -> RepoResult<u64> {
        let key = sanitize_community_name(name);
        self.get_user(username).await?;
        let operation = if join { "join_community" } else { "leave_community" };

        let (_, count) = self
            .repository()
            .modify(EntityKind::Community, &key, &format!("{operation} {key} {username}"), |c: &mut Community| {
                if join {
                    Ok(c.join(username))
                } else if c.creator == username {
                    Err(RepoError::Validation(format!("{username} created {key} and cannot leave")))
                } else {
                    Ok(c.leave(username))
                }
            })
            .await?;
        let mut trail = WriteTrail::new(operation);
        trail.committed(EntityKind::Community.direct_path(&key));

        let user_side = self
            .repository()
            .modify(EntityKind::User, username, &format!("{operation} {key} {username}"), |user: &mut User| {
                if join {
                    user.join(&key);
                } else {
                    user.leave(&key);
                }
                Ok(())
            })
            .await;
        trail.step("user membership", EntityKind::User.direct_path(username), user_side)?;

        let indexed = self.sync_member_count(&key, count).await.map(|_| ());
        trail.step("index member count", INDEX_PATH, indexed)?;

        Ok(count)
    }

    /// Write `count` into the index entry of `key`, then re-read the
    /// community and repeat with its stored count until the two agree.
    /// The last membership change to reach the index therefore leaves the
    /// current count there, whatever order racing joins finished in.
    async fn sync_member_count(&self, key: &str, mut count: u64) -> RepoResult<u64> {
        for _ in 0..self.repository().retry().attempts() {
            self.index()
                .update(&format!("Refresh member count of {key}"), |doc| {
                    if let Some(entry) = doc.communities.get_mut(key) {
                        entry.member_count = count;
                    }
                })
                .await?;
            let stored = self.get_community(key).await?.member_count;
            if stored == count {
                break;
            }
            debug!(community = key, indexed = count, stored, "member count moved, indexing again");
            count = stored;
        }
        Ok(count)
    }
}
