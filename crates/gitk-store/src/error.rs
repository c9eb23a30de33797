use gitk_crypto::EnvelopeError;
use gitk_types::{ErrorKind, ObjectId, ObjectKind};

use crate::backend::BlobError;
use crate::context::Interrupted;

/// Invalid tree contents.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("duplicate entry name {0:?}")]
    DuplicateName(String),

    #[error("entries not in canonical order at {0:?}")]
    Unsorted(String),

    #[error("unknown entry mode {0:?}")]
    UnknownMode(String),
}

/// Malformed serialized object.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("bad envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("unparsable {kind} body: {message}")]
    Body { kind: ObjectKind, message: String },

    #[error("invalid tree: {0}")]
    Tree(#[from] TreeError),
}

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Fetched bytes do not hash to the requested identifier.
    #[error("integrity failure for {id}: content hashes to {computed}")]
    Integrity { id: ObjectId, computed: ObjectId },

    /// The backing store failed.
    #[error("{op} {path}: {source}")]
    Transport {
        op: &'static str,
        path: String,
        #[source]
        source: BlobError,
    },

    /// The stored object could not be decoded.
    #[error("cannot decode object {id}: {source}")]
    Decode {
        id: ObjectId,
        #[source]
        source: DecodeError,
    },

    /// A typed read found a different object kind.
    #[error("object {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// The operation context was cancelled or expired.
    #[error("{op} {path}: {reason}")]
    Interrupted {
        op: &'static str,
        path: String,
        reason: Interrupted,
    },
}

impl StoreError {
    /// Wrap a backing-store failure, lifting `NotFound` for object reads.
    pub(crate) fn from_blob(op: &'static str, id: ObjectId, path: String, err: BlobError) -> Self {
        match err {
            BlobError::NotFound { .. } => Self::NotFound(id),
            source => Self::Transport { op, path, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Decode { .. } | Self::KindMismatch { .. } => ErrorKind::Decode,
            Self::Interrupted { .. } => ErrorKind::Cancelled,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
