//! HTTP transport for the tools service.
//!
//! The service speaks plain JSON over HTTP, plus a chunked `text/plain`
//! stream for chat answers. Handlers receive the service objects through
//! axum state; they hold no state of their own.

mod config;
mod error;
pub mod http;

pub use config::HttpConfig;
pub use error::{TransportError, TransportResult};
pub use http::{HttpTransport, router};
