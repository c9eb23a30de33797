//! Content-addressed object storage for gitk.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory, except that the bytes live in a remote blob store
//! reached through the [`BlobClient`] trait. Every blob, tree and commit is
//! stored as an immutable envelope identified by the BLAKE3 hash of its header
//! and content.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary data)
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- a tree snapshot linked to an optional parent commit
//!
//! # Backends
//!
//! All backing stores implement the [`BlobClient`] trait:
//!
//! - [`InMemoryBlobClient`] -- `HashMap`-based client with fault injection, for tests
//! - [`FsBlobClient`] -- one directory per bucket on the local filesystem
//!
//! # Layout
//!
//! Objects live at `<prefix>/objects/<first 2 hex>/<remaining 62 hex>`.
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: write every object, then update references.
//! 3. Every read re-hashes the fetched bytes; a mismatch is an integrity error.
//! 4. There is no cache: every `get`/`exists` is a live round trip.
//! 5. Every operation honours an [`OpContext`] deadline and cancellation token.
//! 6. All backing-store errors are propagated with operation and path context.

pub mod backend;
pub mod context;
pub mod error;
pub mod namespace;
pub mod object;
pub mod store;

// Re-export primary types at crate root for ergonomic imports.
pub use backend::{
    BlobClient, BlobError, BlobResult, EntryHandle, EntryInfo, FsBlobClient, InMemoryBlobClient,
};
pub use context::{Interrupted, OpContext};
pub use error::{DecodeError, StoreError, StoreResult, TreeError};
pub use namespace::Namespace;
pub use object::{Blob, Commit, EntryMode, Object, Tree, TreeEntry};
pub use store::ObjectStore;
