use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockviewError {
    #[error("Please log in to {action}.")]
    AuthRequired { action: &'static str },

    #[error("Camera and microphone access denied or not available: {reason}")]
    PermissionDenied { reason: String },

    #[error("Request to {endpoint} failed: {reason}")]
    NetworkFailure {
        endpoint: &'static str,
        reason: String,
    },

    #[error("{0}")]
    ValidationFailure(String),

    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse {
        endpoint: &'static str,
        reason: String,
    },

    #[error("A {0} request is already in progress")]
    Busy(&'static str),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Audio encoding failed: {0}")]
    AudioError(#[from] hound::Error),
}

impl MockviewError {
    pub fn validation(message: impl Into<String>) -> Self {
        MockviewError::ValidationFailure(message.into())
    }

    /// Wraps a transport-level error for `endpoint`.
    pub fn network(endpoint: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |err| MockviewError::NetworkFailure {
            endpoint,
            reason: if err.is_timeout() {
                "request timed out".to_string()
            } else {
                err.to_string()
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, MockviewError>;
