//! Error types for the VocaDB client core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Api Error Enum ==
/// Unified error type for fetching, caching and paginating results.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote endpoint answered with a non-success status
    #[error("VocaDB API error: {status_code}")]
    RemoteService { status_code: u16 },

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The request never produced a response (DNS, connect, TLS, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The caller passed parameters the remote service cannot answer
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A load-more is already outstanding for this session
    #[error("A page load is already in progress for this session")]
    LoadInProgress,
}

impl ApiError {
    // == Retryable ==
    /// Returns true when the user may simply re-invoke the operation.
    ///
    /// Nothing is retried internally; this only tells the UI whether to offer
    /// a manual retry instead of asking for different input.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ApiError::InvalidRequest(_))
    }
}

// == Conversions ==
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::RemoteService {
                status_code: status.as_u16(),
            },
            None if err.is_decode() => ApiError::MalformedResponse(err.to_string()),
            None => ApiError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedResponse(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the client core.
pub type Result<T> = std::result::Result<T, ApiError>;
