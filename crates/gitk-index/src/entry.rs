//! Index entry types for tracking staged files.

use chrono::{DateTime, Utc};
use gitk_store::EntryMode;
use gitk_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// An entry in the staging index, representing a tracked file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Normalized relative path (`/`-separated).
    pub path: String,
    /// Content-addressed ID of the file's blob in the object store.
    pub object_id: ObjectId,
    /// File mode (regular, executable or symlink).
    pub mode: EntryMode,
    /// File size in bytes; 0 when the entry was loaded from a tree.
    pub size: u64,
    pub staged_at: DateTime<Utc>,
}

impl IndexEntry {
    /// Create a new index entry.
    pub fn new(path: impl Into<String>, object_id: ObjectId, mode: EntryMode, size: u64) -> Self {
        Self {
            path: path.into(),
            object_id,
            mode,
            size,
            staged_at: Utc::now(),
        }
    }
}

/// Normalize a relative path to `/`-separated form.
///
/// Empty paths, absolute paths and `.`/`..` or empty segments are rejected.
pub fn normalize_path(path: &str) -> IndexResult<String> {
    let invalid = |reason: &str| IndexError::InvalidPath(format!("{path:?}: {reason}"));
    let unified = path.replace('\\', "/");
    if unified.is_empty() {
        return Err(invalid("empty path"));
    }
    if unified.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    if unified.contains('\0') {
        return Err(invalid("contains NUL"));
    }
    let trimmed = unified.strip_prefix("./").unwrap_or(&unified);
    for segment in trimmed.split('/') {
        match segment {
            "" => return Err(invalid("empty segment")),
            "." | ".." => return Err(invalid("relative segment")),
            _ => {}
        }
    }
    Ok(trimmed.to_string())
}
