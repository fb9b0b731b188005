//! Chat service: manual resolution and streamed generation.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, instrument, warn};

use super::error::{ChatError, ChatResult};
use crate::domains::gemini::{DynContentGenerator, DynFileStore, FileHandle};
use crate::domains::tools::{DynToolRepository, ResourceRefs};

/// Chunks buffered between the generator task and a slow reader.
const CHANNEL_CAPACITY: usize = 32;

/// One item of a chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Generated text, in arrival order.
    Chunk(String),

    /// Generation finished normally. Always the last event.
    Done,

    /// Generation stopped early. Always the last event.
    Failed(String),
}

impl ChatEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

/// Stream of [`ChatEvent`]s ending with exactly one terminal event.
///
/// Dropping it stops generation.
pub type ChatStream = ReceiverStream<ChatEvent>;

/// Answers questions about a tool using its manuals.
pub struct ChatService {
    repository: DynToolRepository,
    files: DynFileStore,
    generator: DynContentGenerator,
}

impl ChatService {
    pub fn new(
        repository: DynToolRepository,
        files: DynFileStore,
        generator: DynContentGenerator,
    ) -> Self {
        Self {
            repository,
            files,
            generator,
        }
    }

    /// Start answering `query` for `tool_id`.
    ///
    /// Only the tool lookup happens before returning; manual resolution and
    /// generation run in a background task feeding the returned stream.
    #[instrument(skip(self, query))]
    pub async fn chat(&self, tool_id: &str, query: &str) -> ChatResult<ChatStream> {
        let tool = self
            .repository
            .get_tool(tool_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(tool_id.to_string()))?;

        let refs = tool.resource_refs();
        info!("Chat for {} with {} manual references", tool.name, refs.len());

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(generate(
            self.files.clone(),
            self.generator.clone(),
            refs,
            query.to_string(),
            tx,
        ));

        Ok(ReceiverStream::new(rx))
    }
}

/// Resolve each reference to a provider file, skipping those that fail.
async fn resolve_files(files: &DynFileStore, refs: &ResourceRefs) -> Vec<FileHandle> {
    let mut handles = Vec::with_capacity(refs.len());
    for name in refs.iter() {
        match files.get_file(name).await {
            Ok(handle) if handle.is_usable() => handles.push(handle),
            Ok(handle) => warn!("Skipping {} in state {:?}", name, handle.state),
            Err(e) => warn!("Error fetching file {}: {}", name, e),
        }
    }
    handles
}

async fn generate(
    files: DynFileStore,
    generator: DynContentGenerator,
    refs: ResourceRefs,
    query: String,
    tx: mpsc::Sender<ChatEvent>,
) {
    let handles = resolve_files(&files, &refs).await;
    debug!("Resolved {} of {} manuals", handles.len(), refs.len());

    let mut stream = match generator.stream_generate(&handles, &query).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Generation failed to start: {}", e);
            let _ = tx.send(ChatEvent::Failed(e.to_string())).await;
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(text) => {
                if tx.send(ChatEvent::Chunk(text)).await.is_err() {
                    debug!("Chat reader went away, stopping generation");
                    return;
                }
            }
            Err(e) => {
                warn!("Generation stream ended early: {}", e);
                let _ = tx.send(ChatEvent::Failed(e.to_string())).await;
                return;
            }
        }
    }

    let _ = tx.send(ChatEvent::Done).await;
}
