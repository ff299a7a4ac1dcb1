//! Banner and health probes.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::state::AppState;

/// Root banner route.
pub async fn home() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "Drone Report API running" }))
}

/// Liveness probe - process is running and the staging area is reachable.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cycle = state.staging.begin_cycle().await;
    match cycle.len().await {
        Ok(staged) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "staged_fragments": staged,
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": format!("staging: {}", e),
            })),
        ),
    }
}
