use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

/// Errors reported by a backing blob store.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// No entry exists at `bucket/path`.
    #[error("no entry at {bucket}/{path}")]
    NotFound { bucket: String, path: String },

    /// The path cannot be represented by this backend.
    #[error("invalid path {0:?}")]
    InvalidPath(String),

    /// The request failed in transit or at the remote service.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Local I/O failure (filesystem-backed clients).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for blob client calls.
pub type BlobResult<T> = Result<T, BlobError>;

/// A created-but-not-yet-uploaded entry.
///
/// Entries become visible to `download`/`head`/`list` only once uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryHandle {
    pub bucket: String,
    pub path: String,
}

/// Metadata returned by a `head` probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    /// Size of the stored entry in bytes.
    pub size: u64,
}

/// Capability set the core requires from a remote blob store.
///
/// Implementations must be safe to share across tasks. Writing to an existing
/// path replaces its content; there is no conditional write.
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// Reserve an entry at `bucket/path`.
    async fn create_entry(&self, bucket: &str, path: &str) -> BlobResult<EntryHandle>;

    /// Publish the bytes of a previously created entry.
    async fn upload(&self, handle: EntryHandle, data: Bytes) -> BlobResult<()>;

    /// Fetch the bytes at `bucket/path`.
    ///
    /// Returns [`BlobError::NotFound`] if nothing is stored there.
    async fn download(&self, bucket: &str, path: &str) -> BlobResult<Bytes>;

    /// Metadata-only existence probe.
    async fn head(&self, bucket: &str, path: &str) -> BlobResult<Option<EntryInfo>>;

    /// Remove the entry at `bucket/path`.
    ///
    /// Returns [`BlobError::NotFound`] if nothing is stored there.
    async fn delete(&self, bucket: &str, path: &str) -> BlobResult<()>;

    /// Every stored path in `bucket` that starts with `prefix`, sorted.
    async fn list(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>>;

    /// Create and upload in one call.
    async fn put(&self, bucket: &str, path: &str, data: Bytes) -> BlobResult<()> {
        let handle = self.create_entry(bucket, path).await?;
        self.upload(handle, data).await
    }
}

#[async_trait]
impl<T: BlobClient + ?Sized> BlobClient for Arc<T> {
    async fn create_entry(&self, bucket: &str, path: &str) -> BlobResult<EntryHandle> {
        (**self).create_entry(bucket, path).await
    }

    async fn upload(&self, handle: EntryHandle, data: Bytes) -> BlobResult<()> {
        (**self).upload(handle, data).await
    }

    async fn download(&self, bucket: &str, path: &str) -> BlobResult<Bytes> {
        (**self).download(bucket, path).await
    }

    async fn head(&self, bucket: &str, path: &str) -> BlobResult<Option<EntryInfo>> {
        (**self).head(bucket, path).await
    }

    async fn delete(&self, bucket: &str, path: &str) -> BlobResult<()> {
        (**self).delete(bucket, path).await
    }

    async fn list(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>> {
        (**self).list(bucket, prefix).await
    }
}
