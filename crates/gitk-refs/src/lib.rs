//! Reference management for gitk.
//!
//! References are the mutable, human-readable names (branches, tags, remote
//! tracking refs and HEAD) that point at immutable commits. They live in the
//! same remote blob store as objects, under `<prefix>/refs/<name>`, as either
//! a 64-character hex identifier or `ref: <target>`.
//!
//! # Architecture
//!
//! - **Branches** (`refs/heads/*`) advance as new commits are created.
//! - **Tags** (`refs/tags/*`) name a fixed commit.
//! - **Remote refs** (`refs/remotes/<remote>/*`) record what a push or fetch
//!   last saw at a remote.
//! - **HEAD** is normally symbolic (`ref: refs/heads/main`); it is detached
//!   when it holds an identifier directly.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`RefValue`] and [`BranchInfo`]
//! - [`names`] -- Name validation and `refs/` helpers
//! - [`store`] -- [`RefStore`], the blob-store-backed implementation

pub mod error;
pub mod names;
pub mod store;
pub mod types;

pub use error::{RefError, Result};
pub use names::{validate_branch_name, validate_ref_name, validate_remote_name, HEAD};
pub use store::RefStore;
pub use types::{BranchInfo, RefValue};
