//! Gemini provider domain.
//!
//! Manuals are registered with the Gemini Files API so later chat requests
//! can attach them to a prompt by reference. This module holds the provider
//! traits the rest of the service depends on and the REST client that
//! implements them.
//!
//! - `types.rs` - `FileHandle`, wire types, `FileStore` / `ContentGenerator`
//! - `client.rs` - `GeminiClient` (resumable upload, file lookup, SSE streaming)

mod client;
mod error;
mod types;

pub use client::GeminiClient;
pub use error::{GeminiError, GeminiResult};
pub use types::{
    ContentGenerator, DynContentGenerator, DynFileStore, FileHandle, FileStore, TextStream,
};
