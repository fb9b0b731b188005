//! Attachment download and provider registration.

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::error::{UploadError, UploadResult};
use crate::domains::gemini::DynFileStore;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Turns an attachment URL into a provider resource reference.
#[async_trait]
pub trait ResourceUploader: Send + Sync {
    /// Download `url` and register it with the provider as `filename`.
    async fn upload(&self, url: &str, filename: &str) -> UploadResult<String>;
}

pub type DynResourceUploader = Arc<dyn ResourceUploader>;

/// Uploader that downloads over HTTP and registers through a [`FileStore`].
///
/// [`FileStore`]: crate::domains::gemini::FileStore
pub struct HttpResourceUploader {
    http: Client,
    files: DynFileStore,
}

impl HttpResourceUploader {
    /// Create an uploader whose downloads give up after `fetch_timeout`.
    pub fn new(files: DynFileStore, fetch_timeout: Duration) -> UploadResult<Self> {
        let http = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| UploadError::Io(std::io::Error::other(e)))?;
        Ok(Self { http, files })
    }
}

#[async_trait]
impl ResourceUploader for HttpResourceUploader {
    #[instrument(skip(self))]
    async fn upload(&self, url: &str, filename: &str) -> UploadResult<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UploadError::fetch_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::fetch_failed(url, format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != FALLBACK_MIME);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UploadError::fetch_failed(url, e.to_string()))?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);

        // Removed when `staged` drops, on success and on every error path.
        let staged = tempfile::Builder::new()
            .prefix("makerlab-manual-")
            .suffix(&extension_suffix(filename))
            .tempfile()?;
        tokio::fs::write(staged.path(), &bytes).await?;

        let display_name = display_name(filename, url);
        let mime_type = content_type.unwrap_or_else(|| mime_for_filename(&display_name));

        let handle = self
            .files
            .upload_file(staged.path(), &display_name, &mime_type)
            .await
            .map_err(|e| UploadError::upload_failed(display_name.clone(), e))?;

        info!("Registered {} as {}", display_name, handle.name);
        Ok(handle.name)
    }
}

fn extension_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// The attachment's filename, or the last URL path segment when it has none.
fn display_name(filename: &str, url: &str) -> String {
    let filename = filename.trim();
    if !filename.is_empty() {
        return filename.to_string();
    }
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("manual")
        .to_string()
}

/// MIME type guessed from the file extension.
pub fn mime_for_filename(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFileStore;
    use axum::{Router, http::header, routing::get};

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/m1.pdf",
                get(|| async { ([(header::CONTENT_TYPE, "application/pdf")], "%PDF-1.7 m1") }),
            )
            .route(
                "/raw/guide",
                get(|| async { ([(header::CONTENT_TYPE, "application/octet-stream")], "plain guide") }),
            )
            .route(
                "/slow.pdf",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "too late"
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        base
    }

    fn uploader(store: &Arc<FakeFileStore>, timeout: Duration) -> HttpResourceUploader {
        HttpResourceUploader::new(store.clone(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_upload_returns_provider_reference_and_cleans_up() {
        let base = spawn_server().await;
        let store = Arc::new(FakeFileStore::default());

        let reference = uploader(&store, Duration::from_secs(5))
            .upload(&format!("{}/m1.pdf", base), "m1.pdf")
            .await
            .unwrap();

        assert_eq!(reference, "files/up1");
        let uploads = store.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].existed);
        assert_eq!(uploads[0].bytes, b"%PDF-1.7 m1");
        assert_eq!(uploads[0].display_name, "m1.pdf");
        assert_eq!(uploads[0].mime_type, "application/pdf");
        assert!(uploads[0].path.to_string_lossy().ends_with(".pdf"));
        assert!(!uploads[0].path.exists());
    }

    #[tokio::test]
    async fn test_generic_content_type_falls_back_to_extension() {
        let base = spawn_server().await;
        let store = Arc::new(FakeFileStore::default());

        uploader(&store, Duration::from_secs(5))
            .upload(&format!("{}/raw/guide", base), "guide.txt")
            .await
            .unwrap();

        assert_eq!(store.uploads()[0].mime_type, "text/plain");
    }

    #[tokio::test]
    async fn test_missing_attachment_is_fetch_failed() {
        let base = spawn_server().await;
        let store = Arc::new(FakeFileStore::default());

        let err = uploader(&store, Duration::from_secs(5))
            .upload(&format!("{}/gone.pdf", base), "gone.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::FetchFailed { ref reason, .. } if reason.contains("404")));
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_slow_attachment_times_out() {
        let base = spawn_server().await;
        let store = Arc::new(FakeFileStore::default());

        let err = uploader(&store, Duration::from_millis(200))
            .upload(&format!("{}/slow.pdf", base), "slow.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_provider_rejection_is_upload_failed_and_cleans_up() {
        let base = spawn_server().await;
        let store = Arc::new(FakeFileStore::rejecting());

        let err = uploader(&store, Duration::from_secs(5))
            .upload(&format!("{}/m1.pdf", base), "m1.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::UploadFailed { ref filename, .. } if filename == "m1.pdf"));
        let uploads = store.uploads();
        assert!(uploads[0].existed);
        assert!(!uploads[0].path.exists());
    }

    #[test]
    fn test_display_name_falls_back_to_url_segment() {
        assert_eq!(display_name("", "https://dl.test/a/b/manual.pdf?sig=1"), "manual.pdf");
        assert_eq!(display_name("  ", "https://dl.test/"), "manual");
        assert_eq!(display_name("Guide.PDF", "https://dl.test/x"), "Guide.PDF");
    }

    #[test]
    fn test_mime_for_filename() {
        assert_eq!(mime_for_filename("Guide.PDF"), "application/pdf");
        assert_eq!(mime_for_filename("wiring.png"), "image/png");
        assert_eq!(mime_for_filename("notes"), "application/octet-stream");
    }
}
