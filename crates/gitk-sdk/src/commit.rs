use gitk_store::Commit;
use gitk_types::ObjectId;

/// What to record in a new commit.
///
/// An explicit message wins; otherwise the assistant is asked only when
/// `use_assistant` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitRequest {
    pub message: Option<String>,
    pub use_assistant: bool,
    /// Overrides `[user] author` from the config.
    pub author: Option<String>,
}

impl CommitRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Ask the configured assistant for the message.
    pub fn assisted() -> Self {
        Self {
            use_assistant: true,
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// A stored commit and the reference it moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    pub id: ObjectId,
    pub commit: Commit,
    /// `refs/heads/<branch>` when HEAD was symbolic, otherwise `HEAD`.
    pub updated_ref: String,
}

/// One step of a first-parent history walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
}
