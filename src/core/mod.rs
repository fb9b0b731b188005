//! Core module containing shared infrastructure components.
//!
//! Configuration, the unified error type, service wiring and the HTTP
//! transport live here; business logic lives under [`crate::domains`].

pub mod config;
pub mod error;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::MakerlabServer;
pub use transport::{HttpConfig, HttpTransport};
