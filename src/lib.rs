//! MakerLab Tools service library.
//!
//! Serves the makerspace tool catalog kept in AirTable, keeps each tool's
//! manuals registered with Gemini, and answers questions about a tool by
//! streaming a Gemini answer grounded in those manuals.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, service wiring and the HTTP transport
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: catalog records, search and the AirTable repository
//!   - **gemini**: file registration and streaming generation
//!   - **uploads**: attachment download and upload
//!   - **sync**: manual synchronization job and its background queue
//!   - **chat**: the chat façade
//!
//! # Example
//!
//! ```rust,no_run
//! use makerlab_tools::core::{Config, HttpTransport, MakerlabServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!     let server = MakerlabServer::new(config.clone())?;
//!     HttpTransport::new(config.http).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use core::{Config, Error, MakerlabServer, Result};
