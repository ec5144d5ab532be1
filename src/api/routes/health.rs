//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the database answers a trivial query.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.storage.ping().await {
        true => StatusCode::OK,
        false => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let storage_ok = state.storage.ping().await;

    let scheduler_status = match &state.scheduler {
        Some(scheduler) if scheduler.is_running().await => "running",
        Some(_) => "stopped",
        None => "disabled",
    };
    let scheduler_ok = scheduler_status != "stopped";

    let overall_status = match (storage_ok, scheduler_ok) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        storage: if storage_ok { "ok" } else { "error" }.to_string(),
        scheduler: scheduler_status.to_string(),
        websocket_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
