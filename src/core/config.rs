//! Configuration management for the MakerLab tools service.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally read from a local `.env`
//! file) or defaults.

use super::error::{Error, Result};
use super::transport::HttpConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure for the service.
///
/// Each external collaborator gets its own section so the service objects
/// built from it can be constructed and tested independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP listener configuration.
    pub http: HttpConfig,

    /// AirTable store configuration.
    pub airtable: AirtableConfig,

    /// Gemini provider configuration.
    pub gemini: GeminiConfig,

    /// Background synchronization configuration.
    pub sync: SyncConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the service as reported by the root endpoint.
    pub name: String,

    /// The version of the service.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// AirTable connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct AirtableConfig {
    /// Personal access token.
    pub api_key: String,

    /// Base identifier (`app...`).
    pub base_id: String,

    /// Table holding the tool inventory.
    pub table_name: String,

    /// API root, overridable for tests and proxies.
    pub api_url: String,
}

/// Gemini connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API.
    pub api_key: String,

    /// Model used for chat generation.
    pub model: String,

    /// API root, overridable for tests and proxies.
    pub api_url: String,

    /// Timeout for file upload and lookup calls, in seconds.
    pub request_timeout_secs: u64,
}

impl GeminiConfig {
    /// File call timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Background synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of workers draining the sync queue.
    pub workers: usize,

    /// Maximum number of pending sync requests.
    pub queue_capacity: usize,

    /// Timeout for downloading a single manual attachment, in seconds.
    pub fetch_timeout_secs: u64,

    /// Settled per-record statuses kept for lookup before the oldest are dropped.
    pub status_capacity: usize,
}

impl SyncConfig {
    /// Attachment download timeout as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "[UNSET]" } else { "[REDACTED]" }
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_id: String::new(),
            table_name: "Inventory".to_string(),
            api_url: "https://api.airtable.com/v0".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_secs: 300,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 256,
            fetch_timeout_secs: 60,
            status_capacity: 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "makerlab-tools".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            http: HttpConfig::default(),
            airtable: AirtableConfig::default(),
            gemini: GeminiConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Credentials use the names the AirTable and Gemini dashboards hand out
    /// (`AIRTABLE_API_KEY`, `GEMINI_API_KEY`, ...); service tuning knobs are
    /// prefixed with `MAKERLAB_`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MAKERLAB_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MAKERLAB_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.http = HttpConfig::from_env();

        if let Ok(api_key) = std::env::var("AIRTABLE_API_KEY") {
            config.airtable.api_key = api_key;
            info!("AirTable API key loaded from environment");
        } else {
            warn!("AIRTABLE_API_KEY not set - the tool catalog will be unreachable");
        }
        if let Ok(base_id) = std::env::var("AIRTABLE_BASE_ID") {
            config.airtable.base_id = base_id;
        }
        if let Ok(table_name) = std::env::var("AIRTABLE_TABLE_NAME") {
            config.airtable.table_name = table_name;
        }
        if let Ok(api_url) = std::env::var("AIRTABLE_API_URL") {
            config.airtable.api_url = api_url;
        }

        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            config.gemini.api_key = api_key;
            info!("Gemini API key loaded from environment");
        } else {
            warn!("GEMINI_API_KEY not set - chat and manual sync will fail");
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Ok(api_url) = std::env::var("GEMINI_API_URL") {
            config.gemini.api_url = api_url;
        }

        if let Some(timeout) = parse_env("MAKERLAB_GEMINI_TIMEOUT_SECS") {
            config.gemini.request_timeout_secs = timeout;
        }

        if let Some(workers) = parse_env("MAKERLAB_SYNC_WORKERS") {
            config.sync.workers = workers;
        }
        if let Some(capacity) = parse_env("MAKERLAB_SYNC_QUEUE_CAPACITY") {
            config.sync.queue_capacity = capacity;
        }
        if let Some(timeout) = parse_env("MAKERLAB_FETCH_TIMEOUT_SECS") {
            config.sync.fetch_timeout_secs = timeout;
        }
        if let Some(capacity) = parse_env("MAKERLAB_SYNC_STATUS_CAPACITY") {
            config.sync.status_capacity = capacity;
        }

        config
    }

    /// Check that every credential needed to reach the external services is
    /// present and that the sync settings are usable.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("AIRTABLE_API_KEY", &self.airtable.api_key),
            ("AIRTABLE_BASE_ID", &self.airtable.base_id),
            ("AIRTABLE_TABLE_NAME", &self.airtable.table_name),
            ("GEMINI_API_KEY", &self.gemini.api_key),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.sync.workers == 0 {
            return Err(Error::config("MAKERLAB_SYNC_WORKERS must be at least 1"));
        }
        if self.sync.queue_capacity == 0 {
            return Err(Error::config(
                "MAKERLAB_SYNC_QUEUE_CAPACITY must be at least 1",
            ));
        }
        if self.gemini.request_timeout_secs == 0 {
            return Err(Error::config(
                "MAKERLAB_GEMINI_TIMEOUT_SECS must be at least 1",
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}
