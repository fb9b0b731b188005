//! Chat domain.
//!
//! Answers a question about one tool with the tool's manuals attached to the
//! prompt. Manuals are referenced by the provider file names stored on the
//! tool; references that no longer resolve are skipped.

mod error;
mod service;

pub use error::{ChatError, ChatResult};
pub use service::{ChatEvent, ChatService, ChatStream};
