use cb_index::{UserRef, INDEX_PATH};
use cb_model::{ProfileUpdate, User};
use cb_types::{validate_username, EntityKind};
use chrono::Utc;
use tracing::info;

use crate::board::Board;
use crate::error::{RepoError, RepoResult};
use crate::repository::WriteTrail;

impl Board {
    // ---- User operations ----

    pub async fn create_user(&self, username: &str, password_hash: &str, email: &str) -> RepoResult<User> {
        validate_username(username)?;
        if password_hash.is_empty() {
            return Err(RepoError::Validation("password hash is required".into()));
        }
        if !email.contains('@') {
            return Err(RepoError::Validation(format!("invalid email address: {email:?}")));
        }
        if self.index().snapshot().await?.contains(EntityKind::User, username) {
            return Err(RepoError::AlreadyExists {
                kind: EntityKind::User,
                key: username.to_string(),
            });
        }

        let user = User::new(username, password_hash, email, Utc::now());
        let mut trail = WriteTrail::new("create_user");
        let (path, _) = self
            .repository()
            .create(EntityKind::User, username, &user, &format!("Create user {username}"))
            .await?;
        trail.committed(path.clone());

        let entry = UserRef {
            path,
            created_at: user.created_at,
            avatar_url: None,
        };
        let indexed = self
            .index()
            .update(&format!("Index user {username}"), |doc| {
                doc.users.insert(username.to_string(), entry.clone());
            })
            .await
            .map_err(RepoError::from);
        trail.step("index update", INDEX_PATH, indexed)?;

        info!(username, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, username: &str) -> RepoResult<User> {
        Ok(self.repository().read::<User>(EntityKind::User, username).await?.value)
    }

    /// Apply a partial profile edit. A new avatar is mirrored into the index.
    pub async fn update_user_profile(&self, username: &str, update: &ProfileUpdate) -> RepoResult<User> {
        let (user, ()) = self
            .repository()
            .modify(EntityKind::User, username, &format!("Update profile of {username}"), |user: &mut User| {
                user.apply_profile(update);
                Ok(())
            })
            .await?;

        if update.avatar_url.is_some() {
            let mut trail = WriteTrail::new("update_user_profile");
            trail.committed(EntityKind::User.direct_path(username));
            let avatar = user.avatar_url.clone();
            let indexed = self
                .index()
                .update(&format!("Refresh avatar of {username}"), |doc| {
                    if let Some(entry) = doc.users.get_mut(username) {
                        entry.avatar_url = avatar.clone();
                    }
                })
                .await
                .map_err(RepoError::from);
            trail.step("index avatar refresh", INDEX_PATH, indexed)?;
        }
        Ok(user)
    }

    /// Save or unsave a post. Returns whether it is saved afterwards.
    pub async fn toggle_saved_post(&self, username: &str, post_id: &str) -> RepoResult<bool> {
        self.get_post(post_id).await?;
        let (_, saved) = self
            .repository()
            .modify(EntityKind::User, username, &format!("Toggle saved post for {username}"), |user: &mut User| {
                Ok(user.toggle_saved(post_id))
            })
            .await?;
        Ok(saved)
    }
}
