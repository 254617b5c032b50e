mod agents;
pub mod costs;
mod live;
mod sse;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use observatory_transcripts::{TranscriptStore, TranscriptWatcher};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TranscriptStore>,
    pub watcher: Arc<TranscriptWatcher>,
    pub stats_cache: PathBuf,
}

/// Error body returned as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn create_router(
    store: Arc<TranscriptStore>,
    watcher: Arc<TranscriptWatcher>,
    stats_cache: PathBuf,
) -> Router {
    let state = AppState {
        store,
        watcher,
        stats_cache,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/live/sessions", get(live::list_sessions))
        .route("/api/live/events", get(live::live_events))
        .route("/api/live/current", get(live::current_session))
        .route("/api/live/session/{id}", get(live::session_events))
        .route("/api/live/session/{id}/replay", get(live::replay_session))
        .route("/api/live/stream", get(sse::transcript_changes))
        .route("/api/agents", get(agents::list_agents))
        .route("/api/agents/stats", get(agents::agent_stats))
        .route("/api/agents/session/{id}", get(agents::agents_for_session))
        .route("/api/agents/{id}", get(agents::get_agent))
        .route("/api/costs", get(costs::get_costs))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
