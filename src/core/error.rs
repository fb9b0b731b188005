//! Error types and handling for the MakerLab tools service.
//!
//! This module defines a unified error type that can represent errors from
//! all domains and external dependencies, providing consistent error handling
//! across the entire application.

use thiserror::Error;

/// A specialized Result type for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the service.
///
/// Domain errors convert into this type with `?`; the HTTP layer maps the
/// domain errors directly so it can pick a status code per variant.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tool catalog (AirTable).
    #[error("Tool store error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Error originating from the manual upload pipeline.
    #[error("Upload error: {0}")]
    Upload(#[from] crate::domains::uploads::UploadError),

    /// Error originating from the Gemini provider.
    #[error("Gemini error: {0}")]
    Gemini(#[from] crate::domains::gemini::GeminiError),

    /// Error originating from the synchronization job or its queue.
    #[error("Sync error: {0}")]
    Sync(#[from] crate::domains::sync::SyncError),

    /// Error originating from the chat façade.
    #[error("Chat error: {0}")]
    Chat(#[from] crate::domains::chat::ChatError),

    /// Error originating from the HTTP transport.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
