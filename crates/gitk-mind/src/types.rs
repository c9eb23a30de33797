//! Wire types shared by every assistant implementation.

use serde::{Deserialize, Serialize};

/// Result of a code review over a diff.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub file: String,
    pub line: u32,
    pub message: String,
    /// Free-form category, e.g. `"bug"` or `"style"`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Repository-wide analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub file: String,
    pub line: u32,
    pub message: String,
    #[serde(default)]
    pub severity: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documentation {
    pub content: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub generated: bool,
}

#[derive(Serialize)]
pub(crate) struct DiffRequest<'a> {
    pub diff: &'a str,
}

#[derive(Serialize)]
pub(crate) struct PathRequest<'a> {
    pub path: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct CommitMessage {
    pub message: String,
}
