//! Upload pipeline error types.

use thiserror::Error;

use crate::domains::gemini::GeminiError;

/// Result type for manual uploads.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while moving one attachment to the provider.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Downloading the attachment failed (transport error, timeout, or
    /// non-success status).
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The provider rejected or failed the registration.
    #[error("Failed to upload {filename}: {source}")]
    UploadFailed {
        filename: String,
        #[source]
        source: GeminiError,
    },

    /// Staging the bytes in a temporary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Create a new "fetch failed" error.
    pub fn fetch_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "upload failed" error.
    pub fn upload_failed(filename: impl Into<String>, source: GeminiError) -> Self {
        Self::UploadFailed {
            filename: filename.into(),
            source,
        }
    }
}
