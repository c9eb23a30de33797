//! Index status types.
//!
//! These types represent the result of comparing the index state against
//! its base, the tree of the last commit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Changes staged relative to the base tree, sorted by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStatus {
    pub changes: Vec<StatusEntry>,
}

impl IndexStatus {
    /// Returns `true` if nothing changed.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.changes.iter().filter(|c| c.status == status).count()
    }
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for change in &self.changes {
            writeln!(f, "{} {}", change.status.code(), change.path)?;
        }
        write!(
            f,
            "{} added, {} modified, {} deleted",
            self.count(FileStatus::New),
            self.count(FileStatus::Modified),
            self.count(FileStatus::Deleted)
        )
    }
}

/// A single status entry representing a file change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The file path relative to the repository root.
    pub path: String,
    /// The kind of change.
    pub status: FileStatus,
}

impl StatusEntry {
    /// Create a new status entry.
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// The kind of file change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// A new file that did not previously exist.
    New,
    /// An existing file whose content or mode has changed.
    Modified,
    /// A file that has been removed.
    Deleted,
}

impl FileStatus {
    /// One-letter code used in summaries.
    pub fn code(&self) -> char {
        match self {
            Self::New => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
        }
    }
}
