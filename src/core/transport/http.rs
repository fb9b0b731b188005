//! HTTP transport implementation.
//!
//! JSON endpoints for the tool catalog and sync webhook, plus a chunked
//! `text/plain` body for chat answers. A chat answer that fails midway
//! aborts the body instead of closing it cleanly, so clients can tell a
//! truncated answer from a complete one.

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use super::{HttpConfig, TransportError, TransportResult};
use crate::core::MakerlabServer;
use crate::domains::chat::{ChatError, ChatEvent, ChatStream};
use crate::domains::sync::SyncStatus;
use crate::domains::tools::{Tool, ToolError, search_tools};

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Serve until the listener fails.
    pub async fn run(self, server: MakerlabServer) -> TransportResult<()> {
        let addr = self.address();

        let mut app = router(server);
        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → Tools:   GET /tools, GET /tools/{{id}}");
        info!("  → Chat:    POST /chat");
        info!("  → Webhook: POST /webhooks/airtable");
        info!("  → Health:  GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Every route of the service, with request tracing.
pub fn router(server: MakerlabServer) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/tools/{id}", get(get_tool))
        .route("/chat", post(chat))
        .route("/webhooks/airtable", post(airtable_webhook))
        .route("/webhooks/airtable/{record_id}", get(sync_status))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Error response with a `{"detail": ...}` body.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    fn bad_gateway(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            detail: detail.into(),
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(_) => Self::not_found("Tool not found"),
            other => {
                error!("Tool store failure: {}", other);
                Self::bad_gateway(other.to_string())
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotFound(_) => Self::not_found("Tool not found"),
            ChatError::Upstream(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    query: String,
    tool_id: String,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    record_id: String,
}

#[derive(Debug, Serialize)]
struct SyncStatusBody {
    record_id: String,
    #[serde(flatten)]
    status: SyncStatus,
}

/// Root handler - provides API info.
async fn root_handler(State(server): State<MakerlabServer>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": server.name(),
        "version": server.version(),
        "message": "MakerLab Tools API is running",
        "endpoints": {
            "tools": "/tools",
            "chat": "/chat",
            "webhook": "/webhooks/airtable",
            "health": "/health"
        }
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[instrument(skip(server))]
async fn list_tools(
    State(server): State<MakerlabServer>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Tool>>, ApiError> {
    let tools = server.repository().list_tools().await?;
    let tools = match params.q.as_deref() {
        Some(term) => search_tools(tools, term),
        None => tools,
    };
    Ok(Json(tools))
}

#[instrument(skip(server))]
async fn get_tool(
    State(server): State<MakerlabServer>,
    Path(id): Path<String>,
) -> Result<Json<Tool>, ApiError> {
    server
        .repository()
        .get_tool(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Tool not found"))
}

#[instrument(skip(server, request), fields(tool_id = %request.tool_id))]
async fn chat(
    State(server): State<MakerlabServer>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let events = server.chat().chat(&request.tool_id, &request.query).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        chat_body(events),
    )
        .into_response())
}

/// Chunks become body frames; `Done` ends the body and `Failed` aborts it.
fn chat_body(events: ChatStream) -> Body {
    let frames = stream::unfold(events, |mut events| async move {
        match events.next().await? {
            ChatEvent::Chunk(text) => Some((Ok(Bytes::from(text)), events)),
            ChatEvent::Failed(message) => Some((Err(std::io::Error::other(message)), events)),
            ChatEvent::Done => None,
        }
    });
    Body::from_stream(frames)
}

/// Acknowledges every well-formed notification; the sync runs later.
#[instrument(skip(server, payload), fields(record_id = %payload.record_id))]
async fn airtable_webhook(
    State(server): State<MakerlabServer>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse {
    info!("Webhook received for {}", payload.record_id);
    if let Err(e) = server.sync_queue().enqueue(&payload.record_id).await {
        warn!("Sync for {} was not queued: {}", payload.record_id, e);
    }
    Json(serde_json::json!({
        "status": "processing",
        "record_id": payload.record_id
    }))
}

async fn sync_status(
    State(server): State<MakerlabServer>,
    Path(record_id): Path<String>,
) -> Result<Json<SyncStatusBody>, ApiError> {
    let status = server
        .sync_queue()
        .status(&record_id)
        .await
        .ok_or_else(|| ApiError::not_found("No sync recorded for this record"))?;
    Ok(Json(SyncStatusBody { record_id, status }))
}
