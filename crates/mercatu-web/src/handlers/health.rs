//! Liveness and status endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use mercatu_common::ApiError;
use mercatu_store::StoreStats;

use crate::extract::Json;
use crate::state::SharedState;

// === API Types ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub store: StoreStats,
}

// === Handlers ===

/// GET /api/ping - Cheap liveness probe.
pub async fn ping(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "message": state.config.server.ping_message,
        "timestamp": chrono::Utc::now(),
    }))
}

/// GET /api/health - Server status plus store counters.
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let stats = state.store.stats().await;

    Json(HealthResponse {
        status: "ok",
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        store: stats,
    })
}

/// Fallback for unknown routes; keeps 404s as JSON like everything else.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}
