//! Health check handlers

use axum::{extract::State, Json};

use crate::state::AppState;
use easyprompt_shared::{HealthState, ServiceHealth, SystemInfo};

/// Get per-component health status
pub async fn health_check(State(state): State<AppState>) -> Json<Vec<ServiceHealth>> {
    Json(state.health_service.check_all().await)
}

/// Get system information
pub async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    Json(state.health_service.get_system_info())
}

/// Simple liveness probe
pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "timestamp": chrono::Utc::now()
    }))
}

/// Readiness probe
pub async fn readiness(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.health_service.get_health_status().await;

    Json(serde_json::json!({
        "status": if status == HealthState::Unhealthy { "not_ready" } else { "ready" },
        "timestamp": chrono::Utc::now()
    }))
}
