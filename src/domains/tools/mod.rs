//! Tool catalog domain.
//!
//! This module owns the `Tool` record shape and its projection from the
//! AirTable inventory table. Tools are created and edited in AirTable only;
//! the service reads them per request and writes back a single field, the
//! list of Gemini resource references for the tool's manuals.
//!
//! ## Architecture
//!
//! - `model.rs` - `Tool`, `Attachment` and the `ResourceRefs` list
//! - `repository.rs` - the `ToolRepository` trait used by every consumer
//! - `airtable.rs` - AirTable REST implementation of the repository
//! - `search.rs` - catalog filtering and image link normalization
//! - `error.rs` - catalog error types

mod airtable;
mod error;
mod model;
mod repository;
mod search;

pub use airtable::{AirtableRepository, RESOURCE_IDS_FIELD};
pub use error::{ToolError, ToolResult};
pub use model::{Attachment, ResourceRefs, Tool};
pub use repository::{DynToolRepository, ToolRepository};
pub use search::{normalize_image_url, search_tools};
