//! Error types for reference operations.

use gitk_store::{BlobError, Interrupted};
use gitk_types::{ErrorKind, ObjectId};
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was never set (or was deleted).
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The reference name is invalid.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Stored content is neither an identifier nor `ref: <target>`.
    #[error("malformed ref {name}: {content:?}")]
    Malformed { name: String, content: String },

    /// A symbolic reference points at another symbolic reference.
    #[error("ref {name} -> {target} needs more than one level of resolution")]
    SymbolicChain { name: String, target: String },

    /// A conditional update found a different value than expected.
    #[error("ref {name} changed: expected {}, found {}", show(expected), show(actual))]
    Conflict {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// The backing store failed.
    #[error("{op} {path}: {source}")]
    Transport {
        op: &'static str,
        path: String,
        #[source]
        source: BlobError,
    },

    /// The operation context was cancelled or expired.
    #[error("{op} {name}: {reason}")]
    Interrupted {
        op: &'static str,
        name: String,
        reason: Interrupted,
    },
}

fn show(id: &Option<ObjectId>) -> String {
    match id {
        Some(id) => id.short_hex(),
        None => "nothing".to_string(),
    }
}

impl RefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidName { .. } | Self::SymbolicChain { .. } => ErrorKind::InvalidInput,
            Self::Malformed { .. } => ErrorKind::Decode,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Interrupted { .. } => ErrorKind::Cancelled,
        }
    }
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
