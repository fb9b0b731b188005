//! Manual synchronization domain.
//!
//! Keeps each tool's stored resource references in step with its manual
//! attachments by re-uploading every attachment and writing the collected
//! references back to the catalog.
//!
//! - `job.rs` - `SyncJob`: one record or the whole catalog, sequentially
//! - `queue.rs` - `SyncQueue`: bounded queue drained by a worker pool, with
//!   per-record status lookup for webhook-triggered runs

mod error;
mod job;
mod queue;

pub use error::{SyncError, SyncResult};
pub use job::{SyncJob, SyncOutcome, SyncReport, ToolSync};
pub use queue::{SyncQueue, SyncStatus};
