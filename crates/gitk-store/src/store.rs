use std::sync::Arc;

use bytes::Bytes;
use gitk_crypto::{compute_identifier, decode_envelope, encode_envelope, ContentHasher};
use gitk_types::{ObjectId, ObjectKind};
use tracing::{debug, warn};

use crate::backend::{BlobClient, BlobError};
use crate::context::OpContext;
use crate::error::{StoreError, StoreResult};
use crate::namespace::Namespace;
use crate::object::{Blob, Commit, Object, Tree};

/// Content-addressed object store over a remote blob store.
///
/// Invariants:
/// - Objects are immutable once written. The same `(kind, content)` always
///   lands at the same path, so concurrent duplicate writes are harmless.
/// - Every read re-hashes the fetched envelope before decoding it.
/// - Nothing is cached; each call is a round trip to the backing store.
#[derive(Clone)]
pub struct ObjectStore {
    client: Arc<dyn BlobClient>,
    ns: Namespace,
}

impl ObjectStore {
    pub fn new(client: Arc<dyn BlobClient>, ns: Namespace) -> Self {
        Self { client, ns }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    pub fn client(&self) -> &Arc<dyn BlobClient> {
        &self.client
    }

    /// Store `content` of the given kind and return its identifier.
    ///
    /// If the object already exists this is a no-op.
    pub async fn put(
        &self,
        ctx: &OpContext,
        kind: ObjectKind,
        content: &[u8],
    ) -> StoreResult<ObjectId> {
        let id = compute_identifier(kind, content);
        if self.exists(ctx, &id).await? {
            debug!(%id, %kind, "object already present");
            return Ok(id);
        }

        let path = self.ns.object_path(&id);
        let envelope = Bytes::from(encode_envelope(kind, content));
        let size = envelope.len();
        let upload = async {
            let handle = self.client.create_entry(self.ns.bucket(), &path).await?;
            self.client.upload(handle, envelope).await
        };
        self.guard(ctx, "upload", &path, upload)
            .await?
            .map_err(|e| StoreError::from_blob("upload", id, path.clone(), e))?;
        debug!(%id, %kind, bytes = size, "stored object");
        Ok(id)
    }

    /// Serialize and store an object.
    pub async fn put_object(&self, ctx: &OpContext, object: &Object) -> StoreResult<ObjectId> {
        self.put(ctx, object.kind(), &object.serialize()).await
    }

    /// Fetch, verify and unwrap the object stored under `id`.
    pub async fn get(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<(ObjectKind, Vec<u8>)> {
        let path = self.ns.object_path(id);
        let data = self
            .guard(ctx, "download", &path, self.client.download(self.ns.bucket(), &path))
            .await?
            .map_err(|e| StoreError::from_blob("download", *id, path.clone(), e))?;

        let computed = ContentHasher::hash_envelope(&data);
        if computed != *id {
            warn!(%id, %computed, "stored bytes do not match identifier");
            return Err(StoreError::Integrity { id: *id, computed });
        }
        let (kind, content) = decode_envelope(&data).map_err(|e| StoreError::Decode {
            id: *id,
            source: e.into(),
        })?;
        Ok((kind, content.to_vec()))
    }

    /// Fetch and decode an object.
    pub async fn get_object(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Object> {
        let (kind, content) = self.get(ctx, id).await?;
        Object::deserialize(kind, &content).map_err(|source| StoreError::Decode { id: *id, source })
    }

    pub async fn get_blob(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Blob> {
        match self.get_object(ctx, id).await? {
            Object::Blob(blob) => Ok(blob),
            other => Err(mismatch(id, ObjectKind::Blob, &other)),
        }
    }

    pub async fn get_tree(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Tree> {
        match self.get_object(ctx, id).await? {
            Object::Tree(tree) => Ok(tree),
            other => Err(mismatch(id, ObjectKind::Tree, &other)),
        }
    }

    pub async fn get_commit(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Commit> {
        match self.get_object(ctx, id).await? {
            Object::Commit(commit) => Ok(commit),
            other => Err(mismatch(id, ObjectKind::Commit, &other)),
        }
    }

    /// Metadata-only existence probe.
    pub async fn exists(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<bool> {
        let path = self.ns.object_path(id);
        let info = self
            .guard(ctx, "head", &path, self.client.head(self.ns.bucket(), &path))
            .await?
            .map_err(|e| StoreError::from_blob("head", *id, path.clone(), e))?;
        Ok(info.is_some())
    }

    /// Remove an object.
    ///
    /// Administrative only: the caller must know the object is unreachable.
    pub async fn delete(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<()> {
        let path = self.ns.object_path(id);
        self.guard(ctx, "delete", &path, self.client.delete(self.ns.bucket(), &path))
            .await?
            .map_err(|e| StoreError::from_blob("delete", *id, path.clone(), e))?;
        debug!(%id, "deleted object");
        Ok(())
    }

    /// Every identifier stored under this namespace, sorted.
    pub async fn list_all(&self, ctx: &OpContext) -> StoreResult<Vec<ObjectId>> {
        let root = self.ns.objects_root();
        let paths = self
            .guard(ctx, "list", &root, self.client.list(self.ns.bucket(), &root))
            .await?
            .map_err(|source| StoreError::Transport {
                op: "list",
                path: root.clone(),
                source,
            })?;

        let mut ids = Vec::with_capacity(paths.len());
        for path in paths {
            match self.ns.parse_object_path(&path) {
                Some(id) => ids.push(id),
                None => warn!(%path, "skipping non-object entry"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn guard<F, T>(
        &self,
        ctx: &OpContext,
        op: &'static str,
        path: &str,
        fut: F,
    ) -> StoreResult<Result<T, BlobError>>
    where
        F: std::future::Future<Output = Result<T, BlobError>>,
    {
        ctx.run(fut).await.map_err(|reason| StoreError::Interrupted {
            op,
            path: path.to_string(),
            reason,
        })
    }
}

fn mismatch(id: &ObjectId, expected: ObjectKind, found: &Object) -> StoreError {
    StoreError::KindMismatch {
        id: *id,
        expected,
        actual: found.kind(),
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore").field("ns", &self.ns).finish()
    }
}
