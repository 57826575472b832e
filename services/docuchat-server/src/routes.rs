//! Route definitions for the DocuChat server.
//!
//! Provides HTTP endpoints for meetings, chat history, conversation turns,
//! cache inspection, and health checks.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use docuchat_common::{Config, Error};
use docuchat_store::{ChatHistory, HistoryStore, JsonFileStore, Meeting, MeetingStore};

use crate::cache::CacheManager;
use crate::conversation::{ConversationService, EmailDraft};
use crate::provider::{CachedContent, GeminiClient, ModelProvider};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub meetings: Arc<dyn MeetingStore>,
    pub history: Arc<dyn HistoryStore>,
    pub provider: Arc<dyn ModelProvider>,
    pub conversation: Arc<ConversationService>,
}

impl AppState {
    /// Assemble state from explicit parts. Tests use this to inject fakes.
    pub fn new(
        meetings: Arc<dyn MeetingStore>,
        history: Arc<dyn HistoryStore>,
        provider: Arc<dyn ModelProvider>,
        conversation: Arc<ConversationService>,
    ) -> Self {
        Self {
            meetings,
            history,
            provider,
            conversation,
        }
    }

    /// Assemble production state from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let Some(api_key) = config.gemini.api_key.clone() else {
            anyhow::bail!(
                "Gemini API key not configured; set gemini.api_key in config.json \
                 or the GEMINI_API_KEY env var"
            );
        };

        let store = Arc::new(JsonFileStore::new(config.storage.data_dir())?);
        let provider: Arc<dyn ModelProvider> =
            Arc::new(GeminiClient::new(api_key, config.gemini.model.clone()));

        let cache = CacheManager::new(
            provider.clone(),
            store.clone(),
            store.clone(),
            config.gemini.cache_ttl_secs,
        );
        let conversation = Arc::new(ConversationService::new(
            store.clone(),
            store.clone(),
            provider.clone(),
            cache,
        ));

        Ok(Self {
            meetings: store.clone(),
            history: store,
            provider,
            conversation,
        })
    }
}

/// Request body for a conversation turn.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    pub meeting_id: u64,
}

/// Response for a completed conversation turn.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub status: String,
    pub message: String,
    pub data: EmailDraft,
}

/// Landing response for the API root.
#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Response listing the provider-side context caches.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListCachesResponse {
    pub caches: Vec<CachedContent>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

/// Map a service error to its HTTP representation.
fn error_response(err: &Error) -> (StatusCode, Json<ErrorResponse>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Build the API routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api", get(welcome_handler))
        .route("/api/get_meetings", get(get_meetings_handler))
        .route(
            "/api/get_chat_history/:meeting_id",
            get(get_chat_history_handler),
        )
        .route("/api/send_message", post(send_message_handler))
        .route("/api/list_caches", get(list_caches_handler))
        .with_state(state)
}

/// Build health check routes.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Meeting Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Landing message for the API root.
async fn welcome_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to DocuChat".into(),
    })
}

/// List every known meeting.
async fn get_meetings_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Meeting>>, (StatusCode, Json<ErrorResponse>)> {
    state.meetings.list_meetings().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to list meetings");
        error_response(&e)
    })
}

/// Chat history for one meeting. Meetings without history yield an empty
/// array, not an error.
async fn get_chat_history_handler(
    State(state): State<AppState>,
    Path(meeting_id): Path<u64>,
) -> Result<Json<ChatHistory>, (StatusCode, Json<ErrorResponse>)> {
    state
        .history
        .get_history(meeting_id)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(meeting_id, error = %e, "failed to load chat history");
            error_response(&e)
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversation Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Run one conversation turn against the meeting's context cache.
async fn send_message_handler(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let draft = state
        .conversation
        .send_message(request.meeting_id, &request.message)
        .await
        .map_err(|e| {
            tracing::error!(meeting_id = request.meeting_id, error = %e, "send_message failed");
            error_response(&e)
        })?;

    Ok(Json(SendMessageResponse {
        status: "success".into(),
        message: "Message sent successfully".into(),
        data: draft,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// List the provider-side context caches for this API key.
async fn list_caches_handler(
    State(state): State<AppState>,
) -> Result<Json<ListCachesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let caches = state.provider.list_caches().await.map_err(|e| {
        tracing::error!(error = %e, "failed to list caches");
        error_response(&Error::Provider(e.to_string()))
    })?;

    Ok(Json(ListCachesResponse { caches }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Health Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Health check handler.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        service: "docuchat-server".into(),
    })
}
