use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use super::traits::{BlobClient, BlobError, BlobResult, EntryHandle, EntryInfo};

type Key = (String, String);

/// In-memory blob store client.
///
/// Intended for tests and embedding. Entries are held in a `BTreeMap` behind a
/// `RwLock`; bytes are reference-counted so reads are cheap. The client also
/// carries a small fault-injection surface so tests can simulate transport
/// failures and corrupted remote content.
pub struct InMemoryBlobClient {
    entries: RwLock<BTreeMap<Key, Bytes>>,
    uploads: AtomicUsize,
    heads: AtomicUsize,
    downloads: AtomicUsize,
    failing_uploads: RwLock<HashSet<usize>>,
    failing_downloads: RwLock<HashSet<String>>,
}

impl InMemoryBlobClient {
    /// Create a new empty client.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            uploads: AtomicUsize::new(0),
            heads: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            failing_uploads: RwLock::new(HashSet::new()),
            failing_downloads: RwLock::new(HashSet::new()),
        }
    }

    fn read(&self) -> BlobResult<RwLockReadGuard<'_, BTreeMap<Key, Bytes>>> {
        self.entries
            .read()
            .map_err(|e| BlobError::Transport(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> BlobResult<RwLockWriteGuard<'_, BTreeMap<Key, Bytes>>> {
        self.entries
            .write()
            .map_err(|e| BlobError::Transport(format!("lock poisoned: {e}")))
    }

    /// Number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes at `bucket/path`, bypassing fault injection.
    pub fn raw(&self, bucket: &str, path: &str) -> Option<Bytes> {
        self.read()
            .ok()?
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Overwrite `bucket/path` directly, e.g. to simulate remote corruption.
    pub fn put_raw(&self, bucket: &str, path: &str, data: impl Into<Bytes>) {
        if let Ok(mut map) = self.write() {
            map.insert((bucket.to_string(), path.to_string()), data.into());
        }
    }

    /// Make the `n`th upload (1-based, counted from client creation) fail.
    pub fn fail_upload(&self, n: usize) {
        if let Ok(mut set) = self.failing_uploads.write() {
            set.insert(n);
        }
    }

    /// Make every download of `path` fail with a transport error.
    pub fn fail_download(&self, path: &str) {
        if let Ok(mut set) = self.failing_downloads.write() {
            set.insert(path.to_string());
        }
    }

    /// Uploads attempted so far, including failed ones.
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// `head` probes served so far.
    pub fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    /// Downloads served so far.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBlobClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobClient for InMemoryBlobClient {
    async fn create_entry(&self, bucket: &str, path: &str) -> BlobResult<EntryHandle> {
        if path.is_empty() {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        Ok(EntryHandle {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    async fn upload(&self, handle: EntryHandle, data: Bytes) -> BlobResult<()> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let should_fail = self
            .failing_uploads
            .read()
            .map(|set| set.contains(&n))
            .unwrap_or(false);
        if should_fail {
            return Err(BlobError::Transport(format!(
                "injected failure on upload #{n} to {}",
                handle.path
            )));
        }
        self.write()?.insert((handle.bucket, handle.path), data);
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> BlobResult<Bytes> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .failing_downloads
            .read()
            .map(|set| set.contains(path))
            .unwrap_or(false);
        if should_fail {
            return Err(BlobError::Transport(format!(
                "injected failure on download of {path}"
            )));
        }
        self.read()?
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| BlobError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
    }

    async fn head(&self, bucket: &str, path: &str) -> BlobResult<Option<EntryInfo>> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .read()?
            .get(&(bucket.to_string(), path.to_string()))
            .map(|data| EntryInfo {
                size: data.len() as u64,
            }))
    }

    async fn delete(&self, bucket: &str, path: &str) -> BlobResult<()> {
        match self.write()?.remove(&(bucket.to_string(), path.to_string())) {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            }),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>> {
        Ok(self
            .read()?
            .keys()
            .filter(|(b, p)| b == bucket && p.starts_with(prefix))
            .map(|(_, p)| p.clone())
            .collect())
    }
}

impl std::fmt::Debug for InMemoryBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobClient")
            .field("entry_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_download() {
        let client = InMemoryBlobClient::new();
        client.put("b", "a/b/c", Bytes::from_static(b"data")).await.unwrap();
        let data = client.download("b", "a/b/c").await.unwrap();
        assert_eq!(&data[..], b"data");
        assert_eq!(client.upload_count(), 1);
    }

    #[tokio::test]
    async fn buckets_are_isolated() {
        let client = InMemoryBlobClient::new();
        client.put("one", "x", Bytes::from_static(b"1")).await.unwrap();
        assert!(client.head("two", "x").await.unwrap().is_none());
        assert!(matches!(
            client.download("two", "x").await,
            Err(BlobError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn upload_replaces_existing() {
        let client = InMemoryBlobClient::new();
        client.put("b", "ref", Bytes::from_static(b"old")).await.unwrap();
        client.put("b", "ref", Bytes::from_static(b"new")).await.unwrap();
        assert_eq!(&client.download("b", "ref").await.unwrap()[..], b"new");
        assert_eq!(client.len(), 1);
    }

    #[tokio::test]
    async fn head_reports_size() {
        let client = InMemoryBlobClient::new();
        client.put("b", "p", Bytes::from_static(b"12345")).await.unwrap();
        assert_eq!(
            client.head("b", "p").await.unwrap(),
            Some(EntryInfo { size: 5 })
        );
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let client = InMemoryBlobClient::new();
        assert!(matches!(
            client.delete("b", "nope").await,
            Err(BlobError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_filters_by_prefix_and_sorts() {
        let client = InMemoryBlobClient::new();
        for path in ["p/refs/b", "p/objects/aa/1", "p/refs/a", "q/refs/c"] {
            client.put("b", path, Bytes::new()).await.unwrap();
        }
        let refs = client.list("b", "p/refs/").await.unwrap();
        assert_eq!(refs, vec!["p/refs/a".to_string(), "p/refs/b".to_string()]);
    }

    #[tokio::test]
    async fn injected_upload_failure_hits_only_that_upload() {
        let client = InMemoryBlobClient::new();
        client.fail_upload(2);
        client.put("b", "1", Bytes::new()).await.unwrap();
        assert!(matches!(
            client.put("b", "2", Bytes::new()).await,
            Err(BlobError::Transport(_))
        ));
        client.put("b", "3", Bytes::new()).await.unwrap();
        assert!(client.raw("b", "2").is_none());
        assert_eq!(client.upload_count(), 3);
    }

    #[tokio::test]
    async fn injected_download_failure() {
        let client = InMemoryBlobClient::new();
        client.put("b", "x", Bytes::new()).await.unwrap();
        client.fail_download("x");
        assert!(matches!(
            client.download("b", "x").await,
            Err(BlobError::Transport(_))
        ));
    }

    #[test]
    fn debug_format() {
        let client = InMemoryBlobClient::new();
        client.put_raw("b", "x", &b"y"[..]);
        let debug = format!("{client:?}");
        assert!(debug.contains("InMemoryBlobClient"));
        assert!(debug.contains("entry_count"));
    }
}
