//! Test error types.

use praxis_core::InvokeError;
use thiserror::Error;

/// Errors that can occur during testing.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Response body could not be read as requested.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The invocation ended with a usage violation or an unhandled fault.
    #[error("invocation failed: {0}")]
    Invoke(#[from] InvokeError),
}

impl TestError {
    /// The invocation error, if that is what failed.
    pub fn invoke_error(&self) -> Option<&InvokeError> {
        match self {
            Self::Invoke(error) => Some(error),
            _ => None,
        }
    }
}
