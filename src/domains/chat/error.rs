//! Chat error types.

use thiserror::Error;

use crate::domains::tools::ToolError;

/// Result type for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors raised before a chat stream is opened.
///
/// Failures during generation are not errors here; they end the stream with
/// a [`ChatEvent::Failed`](super::ChatEvent::Failed) event.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No tool with the requested id.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The tool catalog could not be read.
    #[error("Tool store error: {0}")]
    Upstream(#[from] ToolError),
}
