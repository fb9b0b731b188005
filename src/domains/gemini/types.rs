//! Gemini wire types and the provider traits built on them.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::error::GeminiResult;

/// A file registered with the provider (`files/...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    /// Resource name, e.g. `files/abc123`. This is the stored reference.
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub mime_type: String,

    /// URI passed back to the model in `fileData` parts.
    #[serde(default)]
    pub uri: String,

    /// `PROCESSING`, `ACTIVE` or `FAILED`.
    #[serde(default)]
    pub state: Option<String>,
}

impl FileHandle {
    /// Whether the provider can still attach this file to a prompt.
    pub fn is_usable(&self) -> bool {
        !self.uri.is_empty() && self.state.as_deref() != Some("FAILED")
    }
}

/// Response of the upload finalize call.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadedFile {
    pub file: FileHandle,
}

/// Body of `models/{model}:streamGenerateContent`.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Part {
    Text(String),
    FileData(FileData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

impl GenerateRequest {
    /// A single user turn: every file first, then the question.
    pub fn user_turn(files: &[FileHandle], prompt: &str) -> Self {
        let mut parts: Vec<Part> = files
            .iter()
            .map(|f| {
                Part::FileData(FileData {
                    mime_type: f.mime_type.clone(),
                    file_uri: f.uri.clone(),
                })
            })
            .collect();
        parts.push(Part::Text(prompt.to_string()));

        Self {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        }
    }
}

/// One streamed `GenerateContentResponse` (only the fields we read).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextPart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// `{"error": {...}}` envelope used by every Google API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

impl GenerateChunk {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Lazily produced text chunks, in arrival order. An `Err` item is final.
pub type TextStream = BoxStream<'static, GeminiResult<String>>;

/// Provider-side file registry.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Register the file at `path` under `display_name`.
    async fn upload_file(
        &self,
        path: &Path,
        display_name: &str,
        mime_type: &str,
    ) -> GeminiResult<FileHandle>;

    /// Look up a previously uploaded file by resource name.
    async fn get_file(&self, name: &str) -> GeminiResult<FileHandle>;
}

/// Streaming text generation.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Start a generation over `files` and `prompt`.
    ///
    /// Errors returned here mean the call never started; errors after that
    /// arrive as the last item of the stream.
    async fn stream_generate(&self, files: &[FileHandle], prompt: &str) -> GeminiResult<TextStream>;
}

pub type DynFileStore = Arc<dyn FileStore>;
pub type DynContentGenerator = Arc<dyn ContentGenerator>;
