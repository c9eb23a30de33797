use std::sync::Arc;

use gitk_refs::RefStore;
use gitk_store::{BlobClient, Namespace, ObjectStore};
use gitk_types::ObjectId;
use serde::{Deserialize, Serialize};

/// Concurrent object copies per transfer phase unless configured otherwise.
pub const DEFAULT_PARALLELISM: usize = 8;

/// One side of a transfer: an object store and the refs that point into it.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub objects: ObjectStore,
    pub refs: RefStore,
}

impl Endpoint {
    pub fn new(client: Arc<dyn BlobClient>, ns: Namespace) -> Self {
        Self {
            objects: ObjectStore::new(client.clone(), ns.clone()),
            refs: RefStore::new(client, ns),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushRequest {
    /// Reference read at the source (e.g. `refs/heads/main`).
    pub source_ref: String,
    /// Reference repointed at the destination.
    pub dest_ref: String,
    /// Allow a non-fast-forward update.
    pub force: bool,
    pub parallelism: usize,
}

impl PushRequest {
    pub fn new(source_ref: impl Into<String>, dest_ref: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            dest_ref: dest_ref.into(),
            force: false,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn parallelism(mut self, n: usize) -> Self {
        self.parallelism = n.max(1);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// Reference read at the remote.
    pub remote_ref: String,
    /// Local remote-tracking reference to set (e.g. `refs/remotes/origin/main`).
    pub local_ref: String,
    pub parallelism: usize,
}

impl FetchRequest {
    pub fn new(remote_ref: impl Into<String>, local_ref: impl Into<String>) -> Self {
        Self {
            remote_ref: remote_ref.into(),
            local_ref: local_ref.into(),
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    pub fn parallelism(mut self, n: usize) -> Self {
        self.parallelism = n.max(1);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefUpdate {
    pub name: String,
    pub old: Option<ObjectId>,
    pub new: ObjectId,
}

impl RefUpdate {
    pub fn is_noop(&self) -> bool {
        self.old == Some(self.new)
    }
}

/// Objects examined by one transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Copied because the receiving side lacked them.
    pub copied: usize,
    /// Already present on the receiving side.
    pub skipped: usize,
    pub bytes: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushResult {
    pub update: RefUpdate,
    pub stats: TransferStats,
    pub forced: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResult {
    pub update: RefUpdate,
    pub stats: TransferStats,
}
