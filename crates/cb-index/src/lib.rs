//! The commitboard index.
//!
//! A single well-known document (`index.json`) maps every user, community
//! and post key to its storage path plus a few cached fields, so listings
//! and fallback lookups do not need to open each document.
//!
//! # Key Types
//!
//! - [`Index`] -- load / repair / save / update against the blob store
//! - [`IndexDoc`] -- the document itself
//! - [`UserRef`], [`CommunityRef`], [`PostRef`] -- per-entity entries

pub mod doc;
pub mod entry;
pub mod error;
pub mod index;

pub use doc::{IndexDoc, INDEX_VERSION};
pub use entry::{CommunityRef, PostRef, UserRef};
pub use error::{IndexError, IndexResult};
pub use index::{Index, INDEX_PATH};
