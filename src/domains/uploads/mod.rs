//! Manual upload domain.
//!
//! Moves one attachment from its AirTable URL to the Gemini Files API and
//! returns the provider's resource reference. Failures are reported, never
//! retried; callers decide whether to skip or abort.

mod error;
mod uploader;

pub use error::{UploadError, UploadResult};
pub use uploader::{DynResourceUploader, HttpResourceUploader, ResourceUploader, mime_for_filename};
