use bytes::Bytes;
use cb_types::Revision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the primary read path returns for a stored path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub revision: Revision,
    pub size: u64,
    /// The payload, or `None` when it is larger than the transport carries
    /// inline. Fetch it by revision through [`crate::BlobBackend::read_object`].
    pub inline: Option<Bytes>,
}

/// One recorded change to the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub message: String,
    pub path: String,
    /// The new revision, or `None` for a deletion.
    pub revision: Option<Revision>,
    pub timestamp: DateTime<Utc>,
}

impl Commit {
    pub fn new(message: &str, path: &str, revision: Option<Revision>) -> Self {
        Self {
            message: message.to_string(),
            path: path.to_string(),
            revision,
            timestamp: Utc::now(),
        }
    }
}
