use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use walkdir::WalkDir;

use super::traits::{BlobClient, BlobError, BlobResult, EntryHandle, EntryInfo};

/// Blob store client backed by a local directory.
///
/// Each bucket is a subdirectory of `root`; entry paths map to files below it.
/// Uploads write to a temporary sibling and rename into place, so readers never
/// observe a partially written entry.
#[derive(Debug)]
pub struct FsBlobClient {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FsBlobClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, bucket: &str, path: &str) -> BlobResult<PathBuf> {
        let mut out = self.root.join(checked_segment(bucket)?);
        if path.is_empty() {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => out.push(part),
                _ => return Err(BlobError::InvalidPath(path.to_string())),
            }
        }
        Ok(out)
    }

    fn not_found(bucket: &str, path: &str) -> BlobError {
        BlobError::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        }
    }
}

fn checked_segment(bucket: &str) -> BlobResult<&str> {
    if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
        return Err(BlobError::InvalidPath(bucket.to_string()));
    }
    Ok(bucket)
}

#[async_trait]
impl BlobClient for FsBlobClient {
    async fn create_entry(&self, bucket: &str, path: &str) -> BlobResult<EntryHandle> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(EntryHandle {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    async fn upload(&self, handle: EntryHandle, data: Bytes) -> BlobResult<()> {
        let target = self.resolve(&handle.bucket, &handle.path)?;
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = target.with_extension(format!("tmp-{}-{n}", std::process::id()));
        tokio::fs::write(&tmp, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(path = %target.display(), bytes = data.len(), "wrote entry");
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> BlobResult<Bytes> {
        let target = self.resolve(bucket, path)?;
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Self::not_found(bucket, path))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn head(&self, bucket: &str, path: &str) -> BlobResult<Option<EntryInfo>> {
        let target = self.resolve(bucket, path)?;
        match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.is_file() => Ok(Some(EntryInfo { size: meta.len() })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, bucket: &str, path: &str) -> BlobResult<()> {
        let target = self.resolve(bucket, path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Self::not_found(bucket, path))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> BlobResult<Vec<String>> {
        let bucket_root = self.root.join(checked_segment(bucket)?);
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || -> BlobResult<Vec<String>> {
            if !bucket_root.exists() {
                return Ok(Vec::new());
            }
            let mut paths = Vec::new();
            for entry in WalkDir::new(&bucket_root).sort_by_file_name() {
                let entry = entry.map_err(|e| BlobError::Transport(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(&bucket_root) else {
                    continue;
                };
                let rel: Vec<_> = rel
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect();
                let rel = rel.join("/");
                // In-flight uploads are not entries yet.
                if rel.contains(".tmp-") {
                    continue;
                }
                if rel.starts_with(&prefix) {
                    paths.push(rel);
                }
            }
            paths.sort();
            Ok(paths)
        })
        .await
        .map_err(|e| BlobError::Transport(format!("list task failed: {e}")))?
    }
}
