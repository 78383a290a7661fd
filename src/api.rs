//! REST API for the shopping assistant
//!
//! Thin transport over the orchestrator: it owns session lifecycle
//! (open / message / close) and nothing else.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::agent::Orchestrator;
use crate::models::OutboundMessage;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionOpened {
    pub session_id: String,
    pub messages: Vec<OutboundMessage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageReply {
    pub session_id: String,
    pub messages: Vec<OutboundMessage>,
    pub ended: bool,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// =============================
/// Session Ids
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

/// Clients may address a session with any string; it maps to the same
/// UUID every time.
pub fn normalize_session_id(raw: &str) -> String {
    let raw = raw.trim();
    uuid::Uuid::parse_str(raw)
        .unwrap_or_else(|_| stable_uuid_from_string(raw))
        .to_string()
}

/// =============================
/// Handlers
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn open_session(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    let messages = state.orchestrator.open_session(&session_id).await;

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(SessionOpened {
            session_id,
            messages,
        })),
    )
}

async fn post_message(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message must not be empty".into())),
        );
    }

    let session_id = normalize_session_id(&raw_id);
    info!(session_id = %session_id, "Received message");

    let outcome = state.orchestrator.on_message(&session_id, &req.message).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(MessageReply {
            session_id,
            messages: outcome.messages,
            ended: outcome.ended,
        })),
    )
}

async fn close_session(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = normalize_session_id(&raw_id);

    if state.orchestrator.close_session(&session_id).await {
        (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "session_id": session_id }))),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Unknown session {}", session_id))),
        )
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/ask-sam/sessions", post(open_session))
        .route("/api/v1/ask-sam/sessions/:id/messages", post(post_message))
        .route("/api/v1/ask-sam/sessions/:id", delete(close_session))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
