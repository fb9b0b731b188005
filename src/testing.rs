//! In-memory substitutes for the external collaborators, used by unit tests.

use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domains::gemini::{
    ContentGenerator, FileHandle, FileStore, GeminiError, GeminiResult, TextStream,
};
use crate::domains::tools::{Attachment, ResourceRefs, Tool, ToolError, ToolRepository, ToolResult};
use crate::domains::uploads::{ResourceUploader, UploadError, UploadResult};

pub fn tool(id: &str, name: &str, attachments: &[(&str, &str)]) -> Tool {
    Tool {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        images: vec![],
        manual_attachments: attachments
            .iter()
            .map(|(url, filename)| Attachment::new(*url, *filename))
            .collect(),
        gemini_resource_ids: None,
    }
}

/// Tool repository over a vector, recording every write.
#[derive(Default)]
pub struct MemoryRepository {
    tools: Mutex<Vec<Tool>>,
    writes: Mutex<Vec<(String, String)>>,
    unavailable: Mutex<bool>,
    get_calls: Mutex<usize>,
    fail_get_from: Mutex<Option<usize>>,
}

impl MemoryRepository {
    pub fn with_tools(tools: Vec<Tool>) -> Self {
        Self {
            tools: Mutex::new(tools),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    /// Make the `n`th `get_tool` call (1-based) and every later one fail.
    pub fn fail_get_tool_from(&self, n: usize) {
        *self.fail_get_from.lock().unwrap() = Some(n);
    }

    fn check(&self) -> ToolResult<()> {
        if *self.unavailable.lock().unwrap() {
            Err(ToolError::upstream("store offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ToolRepository for MemoryRepository {
    async fn list_tools(&self) -> ToolResult<Vec<Tool>> {
        self.check()?;
        Ok(self.tools.lock().unwrap().clone())
    }

    async fn get_tool(&self, id: &str) -> ToolResult<Option<Tool>> {
        self.check()?;
        let call = {
            let mut calls = self.get_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if self.fail_get_from.lock().unwrap().is_some_and(|n| call >= n) {
            return Err(ToolError::upstream("store dropped the connection"));
        }
        Ok(self.tools.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn set_resource_references(&self, id: &str, refs: &ResourceRefs) -> ToolResult<()> {
        self.check()?;
        let mut tools = self.tools.lock().unwrap();
        let tool = tools
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ToolError::not_found(id))?;
        tool.gemini_resource_ids = Some(refs.join());
        self.writes.lock().unwrap().push((id.to_string(), refs.join()));
        Ok(())
    }
}

/// Uploader answering from a URL table; unknown URLs fail to fetch.
#[derive(Default)]
pub struct FakeUploader {
    results: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeUploader {
    pub fn new(results: &[(&str, &str)]) -> Self {
        Self {
            results: results
                .iter()
                .map(|(url, reference)| (url.to_string(), reference.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceUploader for FakeUploader {
    async fn upload(&self, url: &str, _filename: &str) -> UploadResult<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.results
            .get(url)
            .cloned()
            .ok_or_else(|| UploadError::fetch_failed(url, "HTTP 404 Not Found"))
    }
}

/// What the fake file store saw for one upload.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    pub existed: bool,
    pub bytes: Vec<u8>,
    pub display_name: String,
    pub mime_type: String,
}

/// Provider file registry held in memory.
#[derive(Default)]
pub struct FakeFileStore {
    files: Mutex<HashMap<String, FileHandle>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    reject_uploads: bool,
}

impl FakeFileStore {
    pub fn with_files(names: &[&str]) -> Self {
        let store = Self::default();
        for name in names {
            store.insert(name);
        }
        store
    }

    pub fn rejecting() -> Self {
        Self {
            reject_uploads: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, name: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), file_handle(name));
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

pub fn file_handle(name: &str) -> FileHandle {
    FileHandle {
        name: name.to_string(),
        display_name: None,
        mime_type: "application/pdf".to_string(),
        uri: format!("https://files.test/{}", name),
        state: Some("ACTIVE".to_string()),
    }
}

#[async_trait]
impl FileStore for FakeFileStore {
    async fn upload_file(
        &self,
        path: &Path,
        display_name: &str,
        mime_type: &str,
    ) -> GeminiResult<FileHandle> {
        let existed = path.exists();
        let bytes = std::fs::read(path).unwrap_or_default();
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(RecordedUpload {
            path: path.to_path_buf(),
            existed,
            bytes,
            display_name: display_name.to_string(),
            mime_type: mime_type.to_string(),
        });

        if self.reject_uploads {
            return Err(GeminiError::status(400, "unsupported file"));
        }

        let name = format!("files/up{}", uploads.len());
        self.insert(&name);
        Ok(file_handle(&name))
    }

    async fn get_file(&self, name: &str) -> GeminiResult<FileHandle> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| GeminiError::status(404, format!("{} not found", name)))
    }
}

/// How the fake generator should behave.
#[derive(Debug, Clone)]
pub enum Script {
    /// Emit the chunks, then end cleanly.
    Chunks(Vec<&'static str>),
    /// Emit the chunks, then fail.
    FailAfter(Vec<&'static str>),
    /// Refuse to start.
    Refuse,
}

/// Generator replaying a script and recording each call.
pub struct FakeGenerator {
    script: Script,
    calls: Mutex<Vec<(Vec<String>, String)>>,
}

impl FakeGenerator {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// File names and prompt of every call.
    pub fn calls(&self) -> Vec<(Vec<String>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn stream_generate(&self, files: &[FileHandle], prompt: &str) -> GeminiResult<TextStream> {
        self.calls.lock().unwrap().push((
            files.iter().map(|f| f.name.clone()).collect(),
            prompt.to_string(),
        ));

        let items: Vec<GeminiResult<String>> = match &self.script {
            Script::Chunks(chunks) => chunks.iter().map(|c| Ok(c.to_string())).collect(),
            Script::FailAfter(chunks) => chunks
                .iter()
                .map(|c| Ok(c.to_string()))
                .chain(std::iter::once(Err(GeminiError::status(429, "quota exceeded"))))
                .collect(),
            Script::Refuse => return Err(GeminiError::Request("connection refused".to_string())),
        };
        Ok(stream::iter(items).boxed())
    }
}
