//! Tool catalog error types.

use thiserror::Error;

/// Result type for tool catalog operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that can occur while reading or writing the tool catalog.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool record does not exist.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached or refused the request.
    #[error("Tool store unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The backing store answered with a payload we could not interpret.
    #[error("Invalid response from tool store: {0}")]
    InvalidResponse(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a new "upstream unavailable" error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create a new "invalid response" error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}
