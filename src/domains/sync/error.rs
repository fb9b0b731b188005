//! Synchronization error types.

use thiserror::Error;

use crate::domains::tools::ToolError;

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that stop a synchronization run.
///
/// Per-attachment upload failures are not errors at this level; they are
/// counted in the outcome and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading or writing the tool catalog failed.
    #[error("Tool store error: {0}")]
    Store(#[from] ToolError),

    /// The worker pool has shut down.
    #[error("Sync queue is closed")]
    QueueClosed,

    /// Too many pending requests; this one was dropped.
    #[error("Sync queue is full, dropped request for {0}")]
    QueueFull(String),
}
