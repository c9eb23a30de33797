//! Reference storage over the same blob store that holds objects.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use gitk_store::{BlobClient, BlobError, Namespace, OpContext};
use gitk_types::ObjectId;
use tracing::{debug, info};

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::types::RefValue;

/// Mutable name -> identifier mapping under `<prefix>/refs/`.
///
/// Every write is a single backing-store upload, so `set_reference` is
/// last-write-wins. [`RefStore::update_reference_if`] narrows but does not
/// close the race: it re-reads, compares, then writes.
#[derive(Clone)]
pub struct RefStore {
    client: Arc<dyn BlobClient>,
    ns: Namespace,
}

impl RefStore {
    pub fn new(client: Arc<dyn BlobClient>, ns: Namespace) -> Self {
        Self { client, ns }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    /// Point `name` at `id`.
    pub async fn set_reference(&self, ctx: &OpContext, name: &str, id: ObjectId) -> Result<()> {
        validate_ref_name(name)?;
        self.write(ctx, name, &RefValue::Direct(id)).await?;
        info!(name, %id, "updated ref");
        Ok(())
    }

    /// Make `name` a symbolic reference to `target`.
    pub async fn set_symbolic(&self, ctx: &OpContext, name: &str, target: &str) -> Result<()> {
        validate_ref_name(name)?;
        validate_ref_name(target)?;
        self.write(ctx, name, &RefValue::Symbolic(target.to_string())).await?;
        info!(name, target, "updated symbolic ref");
        Ok(())
    }

    /// Raw value of `name`, without resolving symbolic references.
    pub async fn read_reference(&self, ctx: &OpContext, name: &str) -> Result<RefValue> {
        validate_ref_name(name)?;
        let path = self.ns.ref_path(name);
        let data = self
            .guard(ctx, "download", name, self.client.download(self.ns.bucket(), &path))
            .await?
            .map_err(|e| lift(e, "download", name, path))?;
        RefValue::parse(name, &data)
    }

    /// Raw value of `name`, or `None` if it was never set.
    pub async fn try_read_reference(
        &self,
        ctx: &OpContext,
        name: &str,
    ) -> Result<Option<RefValue>> {
        match self.read_reference(ctx, name).await {
            Ok(value) => Ok(Some(value)),
            Err(RefError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The identifier `name` resolves to.
    ///
    /// A symbolic reference is followed exactly one level; its target must be
    /// a direct reference.
    pub async fn get_reference(&self, ctx: &OpContext, name: &str) -> Result<ObjectId> {
        match self.read_reference(ctx, name).await? {
            RefValue::Direct(id) => Ok(id),
            RefValue::Symbolic(target) => match self.read_reference(ctx, &target).await? {
                RefValue::Direct(id) => Ok(id),
                RefValue::Symbolic(_) => Err(RefError::SymbolicChain {
                    name: name.to_string(),
                    target,
                }),
            },
        }
    }

    /// Like [`RefStore::get_reference`], but `None` when the name (or the
    /// target of a symbolic name) does not exist yet.
    pub async fn try_get_reference(&self, ctx: &OpContext, name: &str) -> Result<Option<ObjectId>> {
        match self.get_reference(ctx, name).await {
            Ok(id) => Ok(Some(id)),
            Err(RefError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove `name`. Deleting an absent reference succeeds.
    pub async fn delete_reference(&self, ctx: &OpContext, name: &str) -> Result<()> {
        validate_ref_name(name)?;
        let path = self.ns.ref_path(name);
        match self
            .guard(ctx, "delete", name, self.client.delete(self.ns.bucket(), &path))
            .await?
        {
            Ok(()) => {
                info!(name, "deleted ref");
                Ok(())
            }
            Err(BlobError::NotFound { .. }) => {
                debug!(name, "ref already absent");
                Ok(())
            }
            Err(source) => Err(RefError::Transport {
                op: "delete",
                path,
                source,
            }),
        }
    }

    /// Every reference in the namespace with its raw value.
    ///
    /// Fails as a whole if any entry cannot be read or parsed.
    pub async fn list_references(&self, ctx: &OpContext) -> Result<BTreeMap<String, RefValue>> {
        let root = self.ns.refs_root();
        let paths = self
            .guard(ctx, "list", &root, self.client.list(self.ns.bucket(), &root))
            .await?
            .map_err(|source| RefError::Transport {
                op: "list",
                path: root.clone(),
                source,
            })?;

        let mut refs = BTreeMap::new();
        for path in &paths {
            let Some(name) = self.ns.parse_ref_path(path) else {
                continue;
            };
            let value = self.read_reference(ctx, name).await?;
            refs.insert(name.to_string(), value);
        }
        debug!(count = refs.len(), "listed refs");
        Ok(refs)
    }

    /// References whose name starts with `prefix` (e.g. `refs/heads/`).
    pub async fn list_prefixed(
        &self,
        ctx: &OpContext,
        prefix: &str,
    ) -> Result<BTreeMap<String, RefValue>> {
        let mut refs = self.list_references(ctx).await?;
        refs.retain(|name, _| name.starts_with(prefix));
        Ok(refs)
    }

    /// Set `name` to `new` only if it currently holds `expected`.
    ///
    /// `expected = None` means the reference must not exist. A symbolic value
    /// never matches. Fails with [`RefError::Conflict`] otherwise.
    pub async fn update_reference_if(
        &self,
        ctx: &OpContext,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<()> {
        let current = self.try_read_reference(ctx, name).await?;
        let matches = match (&current, expected) {
            (None, None) => true,
            (Some(RefValue::Direct(id)), Some(want)) => *id == want,
            _ => false,
        };
        if !matches {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual: current.and_then(|v| v.as_direct()),
            });
        }
        self.set_reference(ctx, name, new).await
    }

    async fn write(&self, ctx: &OpContext, name: &str, value: &RefValue) -> Result<()> {
        let path = self.ns.ref_path(name);
        let data = Bytes::from(value.encode());
        let upload = async {
            let handle = self.client.create_entry(self.ns.bucket(), &path).await?;
            self.client.upload(handle, data).await
        };
        self.guard(ctx, "upload", name, upload)
            .await?
            .map_err(|source| RefError::Transport {
                op: "upload",
                path: path.clone(),
                source,
            })
    }

    async fn guard<F, T>(
        &self,
        ctx: &OpContext,
        op: &'static str,
        name: &str,
        fut: F,
    ) -> Result<std::result::Result<T, BlobError>>
    where
        F: Future<Output = std::result::Result<T, BlobError>>,
    {
        ctx.run(fut).await.map_err(|reason| RefError::Interrupted {
            op,
            name: name.to_string(),
            reason,
        })
    }
}

fn lift(err: BlobError, op: &'static str, name: &str, path: String) -> RefError {
    match err {
        BlobError::NotFound { .. } => RefError::NotFound {
            name: name.to_string(),
        },
        source => RefError::Transport { op, path, source },
    }
}

impl std::fmt::Debug for RefStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefStore").field("ns", &self.ns).finish()
    }
}
