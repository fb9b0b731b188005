//! Service wiring and lifecycle management.
//!
//! [`MakerlabServer`] owns every service object the HTTP handlers and the
//! CLI commands need. The external clients are built once here and shared
//! through trait objects, so tests can swap any of them for an in-memory
//! substitute with [`MakerlabServer::from_parts`].

use std::sync::Arc;
use tracing::info;

use super::config::Config;
use super::error::Result;
use crate::domains::{
    chat::ChatService,
    gemini::{DynContentGenerator, DynFileStore, GeminiClient},
    sync::{SyncJob, SyncQueue},
    tools::{AirtableRepository, DynToolRepository},
    uploads::{DynResourceUploader, HttpResourceUploader},
};

/// The assembled tools service.
///
/// Cloning is cheap; every clone shares the same clients and sync queue.
#[derive(Clone)]
pub struct MakerlabServer {
    config: Arc<Config>,
    repository: DynToolRepository,
    chat: Arc<ChatService>,
    sync_job: Arc<SyncJob>,
    sync_queue: SyncQueue,
}

impl MakerlabServer {
    /// Build the service against the real AirTable and Gemini endpoints.
    ///
    /// Must be called inside a tokio runtime: the sync workers are spawned
    /// immediately.
    pub fn new(config: Config) -> Result<Self> {
        let repository: DynToolRepository = Arc::new(AirtableRepository::new(config.airtable.clone())?);

        let gemini = Arc::new(GeminiClient::new(config.gemini.clone())?);
        let files: DynFileStore = gemini.clone();
        let generator: DynContentGenerator = gemini;

        let uploader: DynResourceUploader = Arc::new(HttpResourceUploader::new(
            files.clone(),
            config.sync.fetch_timeout(),
        )?);

        Ok(Self::from_parts(config, repository, files, generator, uploader))
    }

    /// Assemble the service from already-built collaborators.
    pub fn from_parts(
        config: Config,
        repository: DynToolRepository,
        files: DynFileStore,
        generator: DynContentGenerator,
        uploader: DynResourceUploader,
    ) -> Self {
        let config = Arc::new(config);

        let chat = Arc::new(ChatService::new(repository.clone(), files, generator));
        let sync_job = Arc::new(SyncJob::new(repository.clone(), uploader));
        let sync_queue = SyncQueue::start(sync_job.clone(), &config.sync);

        info!("{} v{} assembled", config.server.name, config.server.version);

        Self {
            config,
            repository,
            chat,
            sync_job,
            sync_queue,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The tool catalog.
    pub fn repository(&self) -> &DynToolRepository {
        &self.repository
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    /// Direct access to the synchronization job, used by the CLI commands.
    pub fn sync_job(&self) -> &SyncJob {
        &self.sync_job
    }

    /// Background queue fed by the AirTable webhook.
    pub fn sync_queue(&self) -> &SyncQueue {
        &self.sync_queue
    }
}
