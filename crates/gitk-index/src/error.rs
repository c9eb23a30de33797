//! Error types for the index crate.

use std::path::PathBuf;

use gitk_store::{StoreError, TreeError};
use gitk_types::{ErrorKind, ObjectId};

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The specified path was not found in the index.
    #[error("path not found in index: {0}")]
    PathNotFound(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A staged entry names an object the store no longer holds.
    #[error("staged object {id} for {path} is missing from the store")]
    MissingObject { path: String, id: ObjectId },

    /// Staged entries do not form a valid tree.
    #[error("cannot build tree: {0}")]
    Tree(#[from] TreeError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Reading or writing the index file failed.
    #[error("index file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index file is not valid JSON.
    #[error("malformed index file: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotFound(_) | Self::MissingObject { .. } => ErrorKind::NotFound,
            Self::InvalidPath(_) | Self::Tree(_) => ErrorKind::InvalidInput,
            Self::Store(e) => e.kind(),
            Self::Io { .. } => ErrorKind::Transport,
            Self::Serialization(_) => ErrorKind::Decode,
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
