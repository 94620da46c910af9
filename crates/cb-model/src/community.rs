use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cb_types::new_entity_id;

/// Partial community edit by a moderator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityUpdate {
    pub banner_url: Option<String>,
    pub icon_url: Option<String>,
    pub description: Option<String>,
}

/// A stored community document.
///
/// `member_count` always equals `members.len()`; the creator is a member
/// and moderator from the start and cannot leave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub members: BTreeSet<String>,
    #[serde(default)]
    pub moderators: BTreeSet<String>,
    #[serde(default)]
    pub member_count: u64,
    /// Newest first.
    #[serde(default)]
    pub posts: Vec<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
}

impl Community {
    /// `name` must already be sanitized; `display_name` is what the creator
    /// typed.
    pub fn new(name: &str, display_name: &str, description: &str, creator: &str, now: DateTime<Utc>) -> Self {
        let mut community = Self {
            id: new_entity_id(),
            name: name.to_string(),
            display_name: display_name.trim().to_string(),
            description: description.to_string(),
            creator: creator.to_string(),
            created_at: now,
            members: BTreeSet::from([creator.to_string()]),
            moderators: BTreeSet::from([creator.to_string()]),
            member_count: 0,
            posts: Vec::new(),
            icon_url: None,
            banner_url: None,
        };
        community.recount();
        community
    }

    pub fn is_member(&self, username: &str) -> bool {
        self.members.contains(username)
    }

    pub fn is_moderator(&self, username: &str) -> bool {
        self.moderators.contains(username)
    }

    /// Add a member. Returns the new member count.
    pub fn join(&mut self, username: &str) -> u64 {
        self.members.insert(username.to_string());
        self.recount()
    }

    /// Remove a member. The creator stays. Returns the new member count.
    pub fn leave(&mut self, username: &str) -> u64 {
        if username != self.creator {
            self.members.remove(username);
        }
        self.recount()
    }

    pub fn record_post(&mut self, post_id: &str) {
        self.posts.insert(0, post_id.to_string());
    }

    pub fn apply_update(&mut self, update: &CommunityUpdate) {
        if let Some(url) = &update.banner_url {
            self.banner_url = Some(url.clone());
        }
        if let Some(url) = &update.icon_url {
            self.icon_url = Some(url.clone());
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
    }

    /// Re-derive `member_count` from the member set.
    pub fn recount(&mut self) -> u64 {
        self.member_count = self.members.len() as u64;
        self.member_count
    }
}
