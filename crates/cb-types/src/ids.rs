//! Identifier generation.
//!
//! All ids are UUID v7 rendered without hyphens, so they sort by creation
//! time and are safe to embed in storage paths.

use uuid::Uuid;

fn fresh() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Id for a user or community document.
pub fn new_entity_id() -> String {
    fresh()
}

/// Id for a post; also the post's storage key.
pub fn new_post_id() -> String {
    fresh()
}

/// Id for a comment. Unique within its post.
pub fn new_comment_id() -> String {
    fresh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::validate_document_key;

    #[test]
    fn ids_are_distinct_and_path_safe() {
        let a = new_post_id();
        let b = new_post_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        validate_document_key(&a).unwrap();
    }
}
