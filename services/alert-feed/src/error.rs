//! Error types for the alert feed service

/// Errors that can occur in the alert feed service
#[derive(Debug, thiserror::Error)]
pub enum AlertFeedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid item id '{0}'")]
    InvalidItemId(String),
}

/// Failure classes reported at the poll boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never completed or the server answered with a non-2xx status
    NetworkFailure,
    /// The body could not be decoded into the expected shape
    DecodeFailure,
    Other,
}

impl AlertFeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AlertFeedError::Http(_) | AlertFeedError::Status { .. } => FailureKind::NetworkFailure,
            AlertFeedError::Decode(_) => FailureKind::DecodeFailure,
            _ => FailureKind::Other,
        }
    }
}

/// Result type alias for alert feed operations
pub type Result<T> = std::result::Result<T, AlertFeedError>;
