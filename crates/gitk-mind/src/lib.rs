//! # gitk-mind
//!
//! Optional assistant integration: commit message suggestions, code
//! review, repository analysis and documentation generation. Nothing in
//! the core repository operations calls an assistant unless the user
//! opts in.

pub mod assistant;
pub mod error;
pub mod http;
pub mod types;

pub use assistant::{Assistant, StaticAssistant};
pub use error::{MindError, MindResult};
pub use http::HttpAssistant;
pub use types::{Analysis, Comment, Documentation, Review, Suggestion};
