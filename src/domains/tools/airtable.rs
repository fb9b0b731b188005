//! AirTable-backed tool repository.
//!
//! Talks to the AirTable REST API directly: list with `offset` pagination,
//! fetch by record id, and PATCH the resource-reference field.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::error::{ToolError, ToolResult};
use super::model::{Attachment, ResourceRefs, Tool};
use super::repository::ToolRepository;
use super::search::normalize_image_url;
use crate::core::config::AirtableConfig;

/// Field holding the comma-joined provider file names.
pub const RESOURCE_IDS_FIELD: &str = "Gemini_Resource_Ids";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of `GET /{base}/{table}`.
#[derive(Debug, Deserialize)]
struct RecordPage {
    records: Vec<Record>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: String,
    #[serde(default)]
    fields: RecordFields,
}

#[derive(Debug, Default, Deserialize)]
struct RecordFields {
    #[serde(rename = "Name", default)]
    name: Option<String>,

    #[serde(rename = "Description", default)]
    description: Option<String>,

    #[serde(rename = "Images", default)]
    images: Vec<AttachmentField>,

    #[serde(rename = "Manual Attachments", default)]
    manual_attachments: Vec<AttachmentField>,

    #[serde(rename = "Gemini_Resource_Ids", default)]
    resource_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentField {
    #[serde(default)]
    url: String,
    #[serde(default)]
    filename: String,
}

impl From<Record> for Tool {
    fn from(record: Record) -> Self {
        let fields = record.fields;
        Tool {
            id: record.id,
            name: fields.name.unwrap_or_else(|| "Unknown".to_string()),
            description: fields.description,
            images: fields
                .images
                .iter()
                .filter(|img| !img.url.is_empty())
                .map(|img| normalize_image_url(&img.url))
                .collect(),
            manual_attachments: fields
                .manual_attachments
                .into_iter()
                .map(|a| Attachment::new(a.url, a.filename))
                .collect(),
            gemini_resource_ids: fields.resource_ids.filter(|ids| !ids.trim().is_empty()),
        }
    }
}

/// Tool repository backed by an AirTable table.
#[derive(Clone)]
pub struct AirtableRepository {
    client: Client,
    config: AirtableConfig,
}

impl AirtableRepository {
    /// Create a repository for the configured base and table.
    pub fn new(config: AirtableConfig) -> ToolResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolError::upstream(format!("failed to build HTTP client: {}", e)))?;
        info!(
            "AirTable repository ready (base {}, table {})",
            config.base_id, config.table_name
        );
        Ok(Self { client, config })
    }

    /// `{api_url}/{base}/{table}[/{record}]`, with each segment escaped.
    fn table_url(&self, record_id: Option<&str>) -> ToolResult<Url> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| ToolError::upstream(format!("invalid AirTable URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ToolError::upstream("AirTable URL cannot be a base"))?;
            segments
                .pop_if_empty()
                .push(&self.config.base_id)
                .push(&self.config.table_name);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

/// Map a non-success AirTable status onto the catalog error taxonomy.
fn status_error(status: StatusCode, record_id: Option<&str>) -> ToolError {
    match (status, record_id) {
        (StatusCode::NOT_FOUND, Some(id)) => ToolError::not_found(id),
        _ => ToolError::upstream(format!("AirTable responded with HTTP {}", status)),
    }
}

#[async_trait]
impl ToolRepository for AirtableRepository {
    #[instrument(skip(self))]
    async fn list_tools(&self) -> ToolResult<Vec<Tool>> {
        let url = self.table_url(None)?;
        let mut tools = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self.client.get(url.clone()).bearer_auth(&self.config.api_key);
            if let Some(ref offset) = offset {
                request = request.query(&[("offset", offset)]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(status, None));
            }

            let page: RecordPage = response.json().await?;
            debug!("Fetched {} records", page.records.len());
            tools.extend(page.records.into_iter().map(Tool::from));

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(tools)
    }

    #[instrument(skip(self))]
    async fn get_tool(&self, id: &str) -> ToolResult<Option<Tool>> {
        let url = self.table_url(Some(id))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, None));
        }

        let record: Record = response.json().await?;
        Ok(Some(record.into()))
    }

    #[instrument(skip(self, refs), fields(count = refs.len()))]
    async fn set_resource_references(&self, id: &str, refs: &ResourceRefs) -> ToolResult<()> {
        let url = self.table_url(Some(id))?;
        let mut fields = serde_json::Map::new();
        fields.insert(RESOURCE_IDS_FIELD.to_string(), refs.join().into());
        let body = json!({ "fields": fields });

        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, Some(id)));
        }

        info!("Stored {} resource references on {}", refs.len(), id);
        Ok(())
    }
}
