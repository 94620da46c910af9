//! Versioned blob storage for commitboard.
//!
//! Documents live at named paths in a commit-based store. Every read returns
//! the content together with its [`Revision`]; every write names the revision
//! the writer believes is current and fails with [`StoreError::Conflict`] if
//! the store has moved on.
//!
//! # Layers
//!
//! - [`BlobBackend`] -- the raw transport (remote API, local directory, memory)
//! - [`BlobStore`] -- the adapter every other crate talks to: JSON payloads,
//!   data-root prefixing, the oversized-object fetch path and corrupt-payload
//!   recovery
//!
//! # Backends
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based, for tests and embedding
//! - [`FsBlobStore`] -- directory-backed with a content-addressed object area
//!
//! # Rules
//!
//! 1. A write without a revision is a create; it fails if the path exists.
//! 2. A write or delete with a revision is compare-and-swap.
//! 3. Every successful write or delete records a commit.
//! 4. Unparseable payloads never surface as errors from [`BlobStore::get`].

pub mod adapter;
pub mod entry;
pub mod error;
pub mod fs;
pub mod memory;
pub mod paths;
pub mod retry;
pub mod traits;

pub use adapter::{BlobStore, Fetched};
pub use cb_types::Revision;
pub use entry::{Commit, Entry};
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use retry::RetryPolicy;
pub use traits::BlobBackend;

/// Default largest payload the primary read path returns inline.
pub const DEFAULT_INLINE_LIMIT: usize = 1024 * 1024;
