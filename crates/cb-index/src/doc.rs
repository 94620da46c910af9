use std::collections::BTreeMap;

use cb_types::EntityKind;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::entry::{CommunityRef, PostRef, UserRef};

/// Current index document format.
pub const INDEX_VERSION: u32 = 1;

/// The index document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDoc {
    pub version: u32,
    pub last_updated: DateTime<Utc>,
    pub users: BTreeMap<String, UserRef>,
    pub communities: BTreeMap<String, CommunityRef>,
    pub posts: BTreeMap<String, PostRef>,
}

impl IndexDoc {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: INDEX_VERSION,
            last_updated: now,
            users: BTreeMap::new(),
            communities: BTreeMap::new(),
            posts: BTreeMap::new(),
        }
    }

    /// Stored path for a key, if the index knows it.
    pub fn path_of(&self, kind: EntityKind, key: &str) -> Option<&str> {
        match kind {
            EntityKind::User => self.users.get(key).map(|r| r.path.as_str()),
            EntityKind::Community => self.communities.get(key).map(|r| r.path.as_str()),
            EntityKind::Post => self.posts.get(key).map(|r| r.path.as_str()),
        }
    }

    pub fn contains(&self, kind: EntityKind, key: &str) -> bool {
        self.path_of(kind, key).is_some()
    }

    /// Post ids ordered newest first.
    pub fn posts_newest_first(&self) -> Vec<(&String, &PostRef)> {
        let mut posts: Vec<_> = self.posts.iter().collect();
        posts.sort_by(|(a_id, a), (b_id, b)| b.created_at.cmp(&a.created_at).then_with(|| b_id.cmp(a_id)));
        posts
    }

    /// Rebuild an index from whatever is stored, keeping every part that
    /// still decodes.
    ///
    /// Returns the document and whether anything had to be repaired. Maps
    /// that are missing or not objects become empty; entries that fail to
    /// decode are dropped; sibling maps and entries are preserved.
    pub fn repair(content: &Value, now: DateTime<Utc>) -> (Self, bool) {
        let Some(object) = content.as_object() else {
            warn!("index is not an object, rebuilding");
            return (Self::empty(now), true);
        };

        let mut repaired = false;
        let version = object
            .get("version")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or_else(|| {
                repaired = true;
                INDEX_VERSION
            });
        let last_updated = object
            .get("lastUpdated")
            .and_then(|v| DateTime::<Utc>::deserialize(v).ok())
            .unwrap_or_else(|| {
                repaired = true;
                now
            });

        let users = repair_map::<UserRef>(object.get("users"), "users", &mut repaired);
        let communities =
            repair_map::<CommunityRef>(object.get("communities"), "communities", &mut repaired);
        let posts = repair_map::<PostRef>(object.get("posts"), "posts", &mut repaired);

        (
            Self {
                version,
                last_updated,
                users,
                communities,
                posts,
            },
            repaired,
        )
    }
}

fn repair_map<T: DeserializeOwned>(
    value: Option<&Value>,
    name: &str,
    repaired: &mut bool,
) -> BTreeMap<String, T> {
    let Some(entries) = value.and_then(Value::as_object) else {
        warn!(map = name, "index map missing, recreating empty");
        *repaired = true;
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, raw)| match T::deserialize(raw) {
            Ok(entry) => Some((key.clone(), entry)),
            Err(error) => {
                warn!(map = name, key = %key, %error, "dropping undecodable index entry");
                *repaired = true;
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2024-06-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn complete_document_needs_no_repair() {
        let doc = IndexDoc::empty(now());
        let value = serde_json::to_value(&doc).unwrap();
        let (repaired, changed) = IndexDoc::repair(&value, now());
        assert!(!changed);
        assert_eq!(repaired, doc);
    }

    #[test]
    fn non_object_is_rebuilt() {
        let (doc, changed) = IndexDoc::repair(&json!([1, 2]), now());
        assert!(changed);
        assert_eq!(doc, IndexDoc::empty(now()));
    }

    #[test]
    fn missing_map_is_added_and_siblings_kept() {
        let value = json!({
            "version": 1,
            "lastUpdated": "2024-05-01T00:00:00Z",
            "users": {
                "alice": {"path": "users/alice.json", "createdAt": "2024-05-01T00:00:00Z"}
            },
            "communities": {}
        });
        let (doc, changed) = IndexDoc::repair(&value, now());
        assert!(changed);
        assert_eq!(doc.users.len(), 1);
        assert!(doc.posts.is_empty());
        assert_eq!(doc.path_of(EntityKind::User, "alice"), Some("users/alice.json"));
    }

    #[test]
    fn bad_entries_are_dropped_individually() {
        let value = json!({
            "version": 1,
            "lastUpdated": "2024-05-01T00:00:00Z",
            "users": {},
            "communities": {},
            "posts": {
                "good": {"path": "posts/good.json", "createdAt": "2024-05-01T00:00:00Z"},
                "bad": {"nope": true}
            }
        });
        let (doc, changed) = IndexDoc::repair(&value, now());
        assert!(changed);
        assert!(doc.posts.contains_key("good"));
        assert!(!doc.posts.contains_key("bad"));
    }

    #[test]
    fn newest_first_ordering() {
        let mut doc = IndexDoc::empty(now());
        for (id, day) in [("a", 1), ("b", 3), ("c", 2)] {
            doc.posts.insert(
                id.into(),
                PostRef {
                    path: format!("posts/{id}.json"),
                    created_at: format!("2024-05-0{day}T00:00:00Z").parse().unwrap(),
                    community: "c".into(),
                    author: "u".into(),
                    title: "t".into(),
                },
            );
        }
        let order: Vec<&str> = doc.posts_newest_first().iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }
}
