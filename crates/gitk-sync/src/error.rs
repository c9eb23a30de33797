use gitk_refs::RefError;
use gitk_store::StoreError;
use gitk_types::{ErrorKind, ObjectId, ObjectKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Refs(#[from] RefError),

    #[error("dangling edge {from} -> {to}: target missing")]
    Dangling { from: ObjectId, to: ObjectId },

    #[error("edge {from} -> {to} expects a {expected}, found a {actual}")]
    KindMismatch {
        from: ObjectId,
        to: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("{id} is a {actual}, not a commit")]
    NotACommit { id: ObjectId, actual: ObjectKind },

    #[error("cycle detected at {0}")]
    Cycle(ObjectId),

    #[error("not a fast-forward update for ref {name}: {current} is not an ancestor of {proposed}")]
    NotFastForward {
        name: String,
        current: ObjectId,
        proposed: ObjectId,
    },

    #[error("transfer task failed: {0}")]
    Task(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Refs(e) => e.kind(),
            Self::Dangling { .. } | Self::KindMismatch { .. } | Self::Cycle(_) => {
                ErrorKind::GraphCorruption
            }
            Self::NotACommit { .. } => ErrorKind::InvalidInput,
            Self::NotFastForward { .. } => ErrorKind::Conflict,
            Self::Task(_) => ErrorKind::Transport,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
