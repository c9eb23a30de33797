use std::fmt;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown object kind: {0:?}")]
    UnknownKind(String),
}

/// Coarse classification shared by every gitk error type.
///
/// Each crate keeps its own error enum with full context, and exposes a
/// `kind()` accessor mapping onto this taxonomy so callers can decide on
/// retry or reporting policy without matching on crate-specific variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An object or reference is absent.
    NotFound,
    /// Fetched content does not hash to the requested identifier.
    Integrity,
    /// The backing store failed to complete a request.
    Transport,
    /// A serialized object is malformed.
    Decode,
    /// A cycle, dangling edge or kind mismatch in the object graph.
    GraphCorruption,
    /// The operation was cancelled or its deadline elapsed.
    Cancelled,
    /// A caller-supplied name, path or value is invalid.
    InvalidInput,
    /// A conditional update lost a race, or a push was not a fast-forward.
    Conflict,
}

impl ErrorKind {
    /// Whether retrying the same request may succeed.
    ///
    /// Only transport failures qualify; the core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not-found",
            Self::Integrity => "integrity",
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::GraphCorruption => "graph-corruption",
            Self::Cancelled => "cancelled",
            Self::InvalidInput => "invalid-input",
            Self::Conflict => "conflict",
        };
        f.write_str(s)
    }
}
