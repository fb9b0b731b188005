//! Domains module containing business logic organized by bounded contexts.
//!
//! - **tools**: the tool catalog and its AirTable adapter
//! - **gemini**: the Gemini Files and generation client
//! - **uploads**: attachment download and registration with the provider
//! - **sync**: keeping each tool's resource references in step with its manuals
//! - **chat**: streamed answers grounded in a tool's manuals

pub mod chat;
pub mod gemini;
pub mod sync;
pub mod tools;
pub mod uploads;
