use std::fmt;

use serde::{Deserialize, Serialize};

/// The document kinds that live under a canonical directory and have an
/// entry in the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Community,
    Post,
}

impl EntityKind {
    /// Directory holding documents of this kind, relative to the data root.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Community => "communities",
            Self::Post => "posts",
        }
    }

    /// The canonical direct path for a key, e.g. `posts/<id>.json`.
    pub fn direct_path(&self, key: &str) -> String {
        format!("{}/{key}.json", self.directory())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Community => write!(f, "community"),
            Self::Post => write!(f, "post"),
        }
    }
}
