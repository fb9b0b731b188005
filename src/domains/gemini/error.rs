//! Gemini provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Errors returned by the Gemini REST API or while talking to it.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("Request to Gemini failed: {0}")]
    Request(String),

    /// Gemini answered with a non-success status.
    #[error("Gemini responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response did not have the expected shape.
    #[error("Invalid response from Gemini: {0}")]
    InvalidResponse(String),

    /// Generation was refused for the prompt.
    #[error("Prompt blocked by Gemini: {0}")]
    Blocked(String),

    /// Reading a local file for upload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeminiError {
    /// Create a new "invalid response" error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a new status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
