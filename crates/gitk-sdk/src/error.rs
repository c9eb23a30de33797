use std::path::PathBuf;

use gitk_index::IndexError;
use gitk_mind::MindError;
use gitk_refs::RefError;
use gitk_store::StoreError;
use gitk_sync::SyncError;
use gitk_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a gitk repository: {0}")]
    NotInitialized(PathBuf),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("unknown remote: {0}")]
    UnknownRemote(String),

    #[error("remote already exists: {0}")]
    RemoteExists(String),

    #[error("branch already exists: {0}")]
    BranchExists(String),

    #[error("no commits yet")]
    NoCommits,

    #[error("commit message is empty")]
    EmptyMessage,

    #[error("no assistant configured")]
    NoAssistant,

    #[error("cannot resolve revision {0:?}")]
    UnknownRevision(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("cannot write config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Refs(#[from] RefError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("assistant: {0}")]
    Mind(#[from] MindError),

    #[error("upload task failed: {0}")]
    Task(String),
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized(_)
            | Self::NoCommits
            | Self::UnknownRevision(_)
            | Self::UnknownRemote(_) => ErrorKind::NotFound,
            Self::AlreadyInitialized(_) | Self::RemoteExists(_) | Self::BranchExists(_) => {
                ErrorKind::Conflict
            }
            Self::EmptyMessage | Self::NoAssistant => ErrorKind::InvalidInput,
            Self::Io { .. } | Self::Task(_) => ErrorKind::Transport,
            Self::ConfigParse(_) | Self::ConfigWrite(_) => ErrorKind::Decode,
            Self::Store(e) => e.kind(),
            Self::Refs(e) => e.kind(),
            Self::Sync(e) => e.kind(),
            Self::Index(e) => e.kind(),
            Self::Mind(e) => e.kind(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
