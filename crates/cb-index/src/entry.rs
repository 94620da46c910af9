//! Index entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a user document lives, plus its avatar for author badges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub path: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Where a community document lives, plus what community cards show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRef {
    pub path: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub member_count: u64,
}

/// Where a post document lives, plus the fields listing and retention
/// filter on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRef {
    pub path: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub community: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
}
