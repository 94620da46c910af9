//! Stored documents for commitboard.
//!
//! Everything here is plain data plus the in-memory mutations applied
//! inside a read-modify-write cycle. Nothing in this crate performs I/O.
//!
//! # Key Types
//!
//! - [`User`], [`Community`], [`Post`] -- the three stored document kinds
//! - [`CommentForest`] -- arena-backed comment trees embedded in a post
//! - [`VoteLedger`] -- per-post voter map and derived counters
//!
//! # Invariants
//!
//! 1. `score == upvotes - downvotes`, recomputed on every load and change.
//! 2. `commentCount` equals the number of comments ever inserted.
//! 3. `memberCount == members.len()` and the creator is always a member.
//! 4. Comments are never nested below depth [`MAX_DEPTH`].

pub mod community;
pub mod error;
pub mod forest;
pub mod post;
pub mod user;
pub mod vote;

pub use community::{Community, CommunityUpdate};
pub use error::{ModelError, ModelResult};
pub use forest::{Comment, CommentForest, MAX_DEPTH};
pub use post::{Post, PostKind, TOMBSTONE};
pub use user::{CommentRef, ProfileUpdate, User};
pub use vote::{Vote, VoteLedger, VoteTally};
