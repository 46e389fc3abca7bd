use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetroError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Decoding error: {0}")]
    Decoding(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("A generation is already in progress")]
    GenerationInProgress,
}

impl RetroError {
    /// Whether a caller could reasonably try the same call again.
    ///
    /// Nothing in this crate acts on it; retries are a caller decision.
    pub fn is_retryable(&self) -> bool {
        match self {
            RetroError::Network(_) => true,
            RetroError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RetroError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RetroError::Decoding(e.to_string())
        } else {
            RetroError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RetroError {
    fn from(e: serde_json::Error) -> Self {
        RetroError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RetroError>;
