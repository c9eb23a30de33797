//! Backing blob-store clients.
//!
//! The core only depends on the capability set in [`BlobClient`]. Concrete
//! services (object storage networks, S3-like buckets) live behind it.

mod fs;
mod memory;
mod traits;

pub use fs::FsBlobClient;
pub use memory::InMemoryBlobClient;
pub use traits::{BlobClient, BlobError, BlobResult, EntryHandle, EntryInfo};
