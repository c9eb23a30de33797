use gitk_types::ErrorKind;
use thiserror::Error;

/// Errors from assistant calls.
#[derive(Debug, Error)]
pub enum MindError {
    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{endpoint} failed with status {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// The assistant has no answer configured for this call.
    #[error("assistant unavailable: {0}")]
    Unavailable(String),
}

impl MindError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Status { .. } => ErrorKind::Transport,
            Self::InvalidResponse { .. } => ErrorKind::Decode,
            Self::Unavailable(_) => ErrorKind::InvalidInput,
        }
    }
}

pub type MindResult<T> = Result<T, MindError>;
