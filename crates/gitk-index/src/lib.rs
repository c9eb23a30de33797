//! Staging index for gitk.
//!
//! Tracks which blobs are staged at which paths for the next commit, turns
//! the staged set into nested tree objects, and summarizes what changed since
//! the last committed tree.
//!
//! # Key Types
//!
//! - [`Index`] -- The staging area (BTreeMap-backed), persisted as JSON
//! - [`IndexEntry`] -- A staged file entry
//! - [`IndexStatus`] -- Result of comparing the index with its base tree
//! - [`FileStatus`] -- Kind of change (New, Modified, Deleted)

pub mod entry;
pub mod error;
pub mod index;
pub mod status;

pub use entry::{normalize_path, IndexEntry};
pub use error::{IndexError, IndexResult};
pub use index::{Index, INDEX_FILE};
pub use status::{FileStatus, IndexStatus, StatusEntry};
