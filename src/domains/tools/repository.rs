//! Storage seam for the tool catalog.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::ToolResult;
use super::model::{ResourceRefs, Tool};

/// Read-through access to the tool catalog.
///
/// Implementations never cache: every call reflects the backing store at the
/// time of the call.
#[async_trait]
pub trait ToolRepository: Send + Sync {
    /// All tools, one per row, in store order.
    async fn list_tools(&self) -> ToolResult<Vec<Tool>>;

    /// A single tool, or `None` when no row has this id.
    async fn get_tool(&self, id: &str) -> ToolResult<Option<Tool>>;

    /// Overwrite the resource-reference field of one row.
    ///
    /// Fails with [`ToolError::NotFound`](super::ToolError::NotFound) when the
    /// row does not exist. Concurrent writers race; the last write wins.
    async fn set_resource_references(&self, id: &str, refs: &ResourceRefs) -> ToolResult<()>;
}

/// Shared handle to a repository implementation.
pub type DynToolRepository = Arc<dyn ToolRepository>;
