use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cb_types::new_entity_id;

/// Back-reference from a user to a comment they wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRef {
    pub post_id: String,
    pub comment_id: String,
    pub created_at: DateTime<Utc>,
}

/// Partial profile edit. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub avatar_url: Option<String>,
    pub about: Option<String>,
}

/// A stored user document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub karma: i64,
    /// Newest first.
    #[serde(default)]
    pub posts: Vec<String>,
    /// Newest first.
    #[serde(default)]
    pub comments: Vec<CommentRef>,
    #[serde(default)]
    pub communities: BTreeSet<String>,
    #[serde(default)]
    pub saved_posts: BTreeSet<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub about: String,
}

impl User {
    pub fn new(username: &str, password_hash: &str, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_entity_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            email: email.to_string(),
            created_at: now,
            karma: 0,
            posts: Vec::new(),
            comments: Vec::new(),
            communities: BTreeSet::new(),
            saved_posts: BTreeSet::new(),
            avatar_url: None,
            about: String::new(),
        }
    }

    pub fn record_post(&mut self, post_id: &str) {
        self.posts.insert(0, post_id.to_string());
    }

    pub fn record_comment(&mut self, post_id: &str, comment_id: &str, at: DateTime<Utc>) {
        self.comments.insert(
            0,
            CommentRef {
                post_id: post_id.to_string(),
                comment_id: comment_id.to_string(),
                created_at: at,
            },
        );
    }

    pub fn join(&mut self, community: &str) {
        self.communities.insert(community.to_string());
    }

    pub fn leave(&mut self, community: &str) {
        self.communities.remove(community);
    }

    /// Flip whether `post_id` is saved. Returns `true` if it is now saved.
    pub fn toggle_saved(&mut self, post_id: &str) -> bool {
        if self.saved_posts.remove(post_id) {
            false
        } else {
            self.saved_posts.insert(post_id.to_string());
            true
        }
    }

    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        if let Some(url) = &update.avatar_url {
            self.avatar_url = Some(url.clone());
        }
        if let Some(about) = &update.about {
            self.about = about.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new("alice", "hash", "alice@example.com", Utc::now())
    }

    #[test]
    fn posts_and_comments_are_newest_first() {
        let mut user = alice();
        user.record_post("p1");
        user.record_post("p2");
        assert_eq!(user.posts, vec!["p2", "p1"]);

        user.record_comment("p1", "c1", Utc::now());
        user.record_comment("p2", "c2", Utc::now());
        assert_eq!(user.comments[0].comment_id, "c2");
    }

    #[test]
    fn toggle_saved_flips() {
        let mut user = alice();
        assert!(user.toggle_saved("p1"));
        assert!(user.saved_posts.contains("p1"));
        assert!(!user.toggle_saved("p1"));
        assert!(user.saved_posts.is_empty());
    }

    #[test]
    fn profile_update_is_partial() {
        let mut user = alice();
        user.about = "hello".into();
        user.apply_profile(&ProfileUpdate {
            avatar_url: Some("https://img/a.png".into()),
            about: None,
        });
        assert_eq!(user.avatar_url.as_deref(), Some("https://img/a.png"));
        assert_eq!(user.about, "hello");
    }

    #[test]
    fn stored_shape_is_camel_case() {
        let json = serde_json::to_value(alice()).unwrap();
        assert!(json.get("passwordHash").is_some());
        assert!(json.get("savedPosts").is_some());
    }
}
