//! Entity repository and operation surface for commitboard.
//!
//! Every mutating operation is a read-modify-write cycle against the blob
//! store: resolve the document and its revision, apply an in-memory change,
//! write back naming the revision. Losing the race re-runs the cycle under
//! the configured [`RetryPolicy`](cb_store::RetryPolicy).
//!
//! # Key Types
//!
//! - [`Board`] -- the operations collaborators call
//! - [`Repository`] -- generic create / read / modify over documents
//! - [`DualPathResolver`] -- direct path first, index-recorded path second
//! - [`RepoError`] -- the error taxonomy surfaced to callers
//!
//! # Consistency
//!
//! Operations touching several documents write them one after another.
//! Nothing is rolled back: if a later write fails the caller gets
//! [`RepoError::PartialWriteDrift`] naming what did commit. Readers treat
//! any referenced key with neither a document nor an index entry as gone.

pub mod board;
pub mod comments;
pub mod communities;
pub mod error;
pub mod listing;
pub mod posts;
pub mod repository;
pub mod resolver;
pub mod users;

#[cfg(test)]
mod testing;

pub use board::Board;
pub use error::{RepoError, RepoResult};
pub use listing::{ListScope, SortOrder, DEFAULT_LIMIT, MAX_LIMIT, RANK_WINDOW};
pub use repository::Repository;
pub use resolver::{DualPathResolver, PathLookup, Resolved};
