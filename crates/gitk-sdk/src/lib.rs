//! High-level SDK for gitk.
//!
//! [`Repository`] is the entry point for applications embedding gitk: it
//! loads the repository configuration, connects the object and reference
//! stores to an injected blob-store client, and exposes staging, commits,
//! history, branches, push/fetch, garbage collection and consistency checks.

pub mod commit;
pub mod config;
pub mod error;
pub mod repository;

pub use commit::{CommitOutcome, CommitRequest, LogEntry};
pub use config::{AssistantConfig, CoreConfig, RemoteConfig, RepoConfig, StorageConfig, UserConfig};
pub use error::{SdkError, SdkResult};
pub use repository::{Repository, WorkingFile, DEFAULT_BRANCH};

// Re-export key types
pub use gitk_index::{FileStatus, IndexEntry, IndexStatus};
pub use gitk_mind::{Analysis, Assistant, Documentation, Review};
pub use gitk_refs::{BranchInfo, RefValue};
pub use gitk_store::{
    Blob, BlobClient, Commit, EntryMode, FsBlobClient, InMemoryBlobClient, Object, OpContext, Tree,
    TreeEntry,
};
pub use gitk_sync::{FetchResult, GcReport, PushResult, VerificationReport};
pub use gitk_types::{ErrorKind, ObjectId, ObjectKind};
