//! Gemini REST client.
//!
//! Implements [`FileStore`] with the resumable upload protocol of the Files
//! API and [`ContentGenerator`] with `streamGenerateContent?alt=sse`.

use async_trait::async_trait;
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, future};
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::error::{GeminiError, GeminiResult};
use super::types::{
    ApiErrorEnvelope, ContentGenerator, FileHandle, FileStore, GenerateChunk, GenerateRequest,
    TextStream, UploadedFile,
};
use crate::core::config::GeminiConfig;

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Generative Language API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client for the configured key and model.
    ///
    /// File calls are bounded by the configured request timeout. Generation
    /// streams have no overall timeout and stay open for as long as the
    /// model keeps producing text.
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GeminiError::Request(format!("failed to build HTTP client: {}", e)))?;
        info!("Gemini client ready (model {})", config.model);
        Ok(Self { client, config })
    }

    fn request_timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    fn base(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    fn file_url(&self, name: &str) -> String {
        if name.starts_with("files/") {
            format!("{}/{}/{}", self.base(), API_VERSION, name)
        } else {
            format!("{}/{}/files/{}", self.base(), API_VERSION, name)
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/{}/models/{}:streamGenerateContent",
            self.base(),
            API_VERSION,
            self.config.model
        )
    }
}

/// Turn a non-success response into a [`GeminiError::Status`], preferring the
/// message from the Google error envelope when there is one.
async fn check_status(response: Response) -> GeminiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(GeminiError::status(status.as_u16(), message))
}

#[async_trait]
impl FileStore for GeminiClient {
    #[instrument(skip(self, path))]
    async fn upload_file(
        &self,
        path: &Path,
        display_name: &str,
        mime_type: &str,
    ) -> GeminiResult<FileHandle> {
        let bytes = tokio::fs::read(path).await?;

        // Step 1: open an upload session.
        let start = self
            .client
            .post(format!("{}/upload/{}/files", self.base(), API_VERSION))
            .timeout(self.request_timeout())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GeminiError::invalid_response("upload session without upload URL"))?;

        // Step 2: send the bytes and finalize in one request.
        let size = bytes.len();
        let finish = self
            .client
            .post(upload_url)
            .timeout(self.request_timeout())
            .header("X-Goog-Upload-Offset", 0)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let uploaded: UploadedFile = check_status(finish).await?.json().await?;

        info!(
            "Uploaded {} ({} bytes) as {}",
            display_name, size, uploaded.file.name
        );
        Ok(uploaded.file)
    }

    #[instrument(skip(self))]
    async fn get_file(&self, name: &str) -> GeminiResult<FileHandle> {
        let response = self
            .client
            .get(self.file_url(name))
            .timeout(self.request_timeout())
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        let file: FileHandle = check_status(response).await?.json().await?;
        debug!("Resolved {} ({:?})", file.name, file.state);
        Ok(file)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    #[instrument(skip(self, files, prompt), fields(files = files.len()))]
    async fn stream_generate(&self, files: &[FileHandle], prompt: &str) -> GeminiResult<TextStream> {
        let response = self
            .client
            .post(self.stream_url())
            .query(&[("alt", "sse")])
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&GenerateRequest::user_turn(files, prompt))
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(decode_stream(response.bytes_stream()))
    }
}

/// Map an SSE body of `GenerateContentResponse` events to text chunks.
///
/// The first error ends the stream.
fn decode_stream<S>(body: S) -> TextStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    body.eventsource()
        .map(|event| match event {
            Ok(event) => decode_event(&event.data),
            Err(e) => {
                warn!("Generation stream interrupted: {}", e);
                Err(GeminiError::Request(e.to_string()))
            }
        })
        .filter_map(|item| future::ready(item.transpose()))
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}

/// Text carried by one event; `None` for events without text.
fn decode_event(data: &str) -> GeminiResult<Option<String>> {
    if data.trim().is_empty() {
        return Ok(None);
    }
    let chunk: GenerateChunk = serde_json::from_str(data)
        .map_err(|e| GeminiError::invalid_response(format!("bad stream event: {}", e)))?;

    if let Some(error) = &chunk.error {
        return Err(GeminiError::status(error.code, error.message.clone()));
    }
    if let Some(reason) = chunk
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(GeminiError::Blocked(reason));
    }

    let text = chunk.text();
    Ok((!text.is_empty()).then_some(text))
}
