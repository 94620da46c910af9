//! Foundation types for commitboard.
//!
//! Every other commitboard crate depends on `cb-types`. Nothing here performs
//! I/O; these are the small value types the storage layer passes around.
//!
//! # Key Types
//!
//! - [`Revision`] -- BLAKE3 content hash used as a compare-and-swap token
//! - [`EntityKind`] -- the three indexed document kinds and their directories
//! - [`Actor`] -- the acting identity handed in by a collaborator
//! - [`names`] -- username / community name / document key rules
//! - [`slug`] -- post slug derivation

pub mod actor;
pub mod error;
pub mod ids;
pub mod kind;
pub mod names;
pub mod revision;
pub mod slug;

pub use actor::Actor;
pub use error::{TypeError, TypeResult};
pub use ids::{new_comment_id, new_entity_id, new_post_id};
pub use kind::EntityKind;
pub use names::{
    sanitize_community_name, validate_community_name, validate_document_key, validate_username,
};
pub use revision::Revision;
pub use slug::post_slug;
