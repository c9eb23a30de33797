//! The core Index structure managing staged entries.
//!
//! The [`Index`] manages a `BTreeMap<String, IndexEntry>` as the staging area.
//! Blob uploads and working-tree scanning belong to the caller; the index only
//! records identifiers and turns them into trees.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use gitk_store::{EntryMode, ObjectStore, OpContext, Tree, TreeEntry};
use gitk_types::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entry::{normalize_path, IndexEntry};
use crate::error::{IndexError, IndexResult};
use crate::status::{FileStatus, IndexStatus, StatusEntry};

/// File name of the persisted index inside the repository's `.gitk` directory.
pub const INDEX_FILE: &str = "index.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct BaseEntry {
    object_id: ObjectId,
    mode: EntryMode,
}

/// The staging index: the full set of paths for the next commit.
///
/// `base` remembers what the last commit's tree held so that [`Index::status`]
/// can report additions, modifications and deletions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// The index format version.
    pub version: u32,
    entries: BTreeMap<String, IndexEntry>,
    #[serde(default)]
    base: BTreeMap<String, BaseEntry>,
}

impl Index {
    pub const VERSION: u32 = 1;

    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Self::default()
        }
    }

    /// Load an index file; a missing file yields an empty index.
    pub fn load(path: &Path) -> IndexResult<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(source) => Err(IndexError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the index file, replacing it atomically.
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        let io = |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io)?;
        std::fs::rename(&tmp, path).map_err(io)?;
        debug!(path = %path.display(), entries = self.entries.len(), "saved index");
        Ok(())
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// All staged paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage an already-stored blob at `path`, replacing any previous entry.
    ///
    /// A path cannot be both a file and a directory: staging `a/b` while `a`
    /// is staged (or the reverse) is an invalid path.
    pub fn stage(
        &mut self,
        path: &str,
        object_id: ObjectId,
        mode: EntryMode,
        size: u64,
    ) -> IndexResult<()> {
        let path = normalize_path(path)?;
        if mode == EntryMode::Directory {
            return Err(IndexError::InvalidPath(format!(
                "{path}: directories are derived from file paths"
            )));
        }
        if let Some(conflict) = self.conflicting_entry(&path) {
            return Err(IndexError::InvalidPath(format!(
                "{path}: conflicts with staged {conflict}"
            )));
        }
        self.entries
            .insert(path.clone(), IndexEntry::new(path, object_id, mode, size));
        Ok(())
    }

    /// A staged file that is an ancestor or a descendant of `path`.
    fn conflicting_entry(&self, path: &str) -> Option<&str> {
        let mut ancestor = split_parent(path).0;
        while !ancestor.is_empty() {
            if let Some((key, _)) = self.entries.get_key_value(ancestor) {
                return Some(key.as_str());
            }
            ancestor = split_parent(ancestor).0;
        }
        let dir = format!("{path}/");
        self.entries
            .range(dir.clone()..)
            .next()
            .map(|(key, _)| key.as_str())
            .filter(|key| key.starts_with(&dir))
    }

    /// Remove an entry from the index entirely.
    pub fn remove(&mut self, path: &str) -> IndexResult<IndexEntry> {
        let path = normalize_path(path)?;
        self.entries
            .remove(&path)
            .ok_or(IndexError::PathNotFound(path))
    }

    /// Drop every entry (the base is kept).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // ---------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------

    /// Compare the staged entries with the base tree.
    pub fn status(&self) -> IndexStatus {
        let mut changes = Vec::new();
        for (path, entry) in &self.entries {
            match self.base.get(path) {
                None => changes.push(StatusEntry::new(path, FileStatus::New)),
                Some(base) if base.object_id != entry.object_id || base.mode != entry.mode => {
                    changes.push(StatusEntry::new(path, FileStatus::Modified))
                }
                Some(_) => {}
            }
        }
        for path in self.base.keys() {
            if !self.entries.contains_key(path) {
                changes.push(StatusEntry::new(path, FileStatus::Deleted));
            }
        }
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        IndexStatus { changes }
    }

    /// Deterministic change listing, one `<code> <path>` line per change.
    pub fn summary(&self) -> String {
        self.status().to_string()
    }

    /// Record the current entries as the committed base.
    pub fn mark_committed(&mut self) {
        self.base = self
            .entries
            .iter()
            .map(|(path, e)| {
                (
                    path.clone(),
                    BaseEntry {
                        object_id: e.object_id,
                        mode: e.mode,
                    },
                )
            })
            .collect();
    }

    // ---------------------------------------------------------------
    // Tree building
    // ---------------------------------------------------------------

    /// Store nested trees for every staged entry and return the root tree.
    ///
    /// Every staged object is probed first and a missing one fails the call
    /// before any tree is stored. Directories are then written deepest first,
    /// so a tree is only stored after every subtree it references.
    pub async fn write_tree(&self, ctx: &OpContext, store: &ObjectStore) -> IndexResult<ObjectId> {
        let mut probed = BTreeSet::new();
        for (path, entry) in &self.entries {
            if probed.insert(entry.object_id) && !store.exists(ctx, &entry.object_id).await? {
                return Err(IndexError::MissingObject {
                    path: path.clone(),
                    id: entry.object_id,
                });
            }
        }

        let mut dirs: BTreeMap<String, Vec<TreeEntry>> = BTreeMap::new();
        dirs.insert(String::new(), Vec::new());
        for (path, entry) in &self.entries {
            let (parent, name) = split_parent(path);
            let mut ancestor = parent;
            while !ancestor.is_empty() && !dirs.contains_key(ancestor) {
                dirs.insert(ancestor.to_string(), Vec::new());
                ancestor = split_parent(ancestor).0;
            }
            dirs.entry(parent.to_string())
                .or_default()
                .push(TreeEntry::new(name, entry.mode, entry.object_id));
        }

        let mut order: Vec<String> = dirs.keys().cloned().collect();
        order.sort_by_key(|dir| Reverse(depth(dir)));

        let mut root = None;
        for dir in order {
            let entries = dirs.remove(&dir).unwrap_or_default();
            let tree = Tree::new(entries)?;
            let id = store.put_object(ctx, &tree.into()).await?;
            if dir.is_empty() {
                root = Some(id);
            } else {
                let (parent, name) = split_parent(&dir);
                dirs.entry(parent.to_string())
                    .or_default()
                    .push(TreeEntry::new(name, EntryMode::Directory, id));
            }
        }
        let root = match root {
            Some(root) => root,
            None => store.put_object(ctx, &Tree::empty().into()).await?,
        };
        debug!(%root, entries = self.entries.len(), "wrote tree");
        Ok(root)
    }

    /// Replace the index (and its base) with the contents of `tree_id`.
    pub async fn read_tree(
        &mut self,
        ctx: &OpContext,
        store: &ObjectStore,
        tree_id: &ObjectId,
    ) -> IndexResult<()> {
        let mut entries = BTreeMap::new();
        let mut pending = vec![(String::new(), *tree_id)];
        while let Some((prefix, id)) = pending.pop() {
            let tree = store.get_tree(ctx, &id).await?;
            for te in &tree {
                let path = if prefix.is_empty() {
                    te.name.clone()
                } else {
                    format!("{prefix}/{}", te.name)
                };
                if te.mode == EntryMode::Directory {
                    pending.push((path, te.target));
                } else {
                    entries.insert(path.clone(), IndexEntry::new(path, te.target, te.mode, 0));
                }
            }
        }
        self.entries = entries;
        self.mark_committed();
        debug!(tree = %tree_id, entries = self.entries.len(), "read tree into index");
        Ok(())
    }
}

/// `"a/b/c"` -> `("a/b", "c")`; `"c"` -> `("", "c")`.
fn split_parent(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

fn depth(dir: &str) -> usize {
    if dir.is_empty() {
        0
    } else {
        dir.matches('/').count() + 1
    }
}
