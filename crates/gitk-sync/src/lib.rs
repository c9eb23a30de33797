//! Reachability and synchronization for gitk.
//!
//! Computes the closure of objects reachable from a commit and uses it to
//! push and fetch between two blob-store namespaces. Objects are always copied
//! before the reference that names them moves, so a failed or cancelled
//! transfer never leaves a reference pointing at an incomplete history.
//! The same walk drives garbage collection and consistency checks.

pub mod error;
pub mod gc;
pub mod reachability;
pub mod source;
pub mod transfer;
pub mod types;
pub mod verifier;

pub use error::{SyncError, SyncResult};
pub use gc::{collect_garbage, GcReport};
pub use reachability::{reachable_from, Reachable, Walker};
pub use source::ObjectSource;
pub use transfer::{copy_objects, fetch, push};
pub use types::{
    Endpoint, FetchRequest, FetchResult, PushRequest, PushResult, RefUpdate, TransferStats,
    DEFAULT_PARALLELISM,
};
pub use verifier::{verify_repository, VerificationReport};
