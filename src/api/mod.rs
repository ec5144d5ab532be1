//! Hydrocult REST API
//!
//! HTTP API layer for Hydrocult, built with Axum. Every `/api/v1` route
//! acts on the user named by the identity header.
//!
//! # Endpoints
//!
//! ## Logs
//! - `GET /api/v1/logs` - Logs of one day
//! - `POST /api/v1/logs` - Log a drink
//! - `DELETE /api/v1/logs/:id` - Delete a log
//! - `GET /api/v1/progress` - Daily progress
//!
//! ## Goal & Settings
//! - `GET /api/v1/goal`, `PUT /api/v1/goal`
//! - `GET /api/v1/settings`, `PUT /api/v1/settings`
//! - `GET /api/v1/notifications`, `PUT /api/v1/notifications`
//!
//! ## Reminders
//! - `GET /api/v1/reminders`, `PUT /api/v1/reminders`
//! - `POST /api/v1/reminders/times` - Add a custom time
//! - `DELETE /api/v1/reminders/times/:time` - Remove a custom time
//! - `GET /api/v1/reminders/next` - Next due reminder
//!
//! ## Reports
//! - `GET /api/v1/reports` - 7 or 30 day report
//! - `GET /api/v1/achievements` - Achievement catalog
//! - `GET /api/v1/export` - Export logs
//!
//! ## Account
//! - `DELETE /api/v1/account` - Delete all data of the caller
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Real-time updates for the caller
//!
//! # Example
//!
//! ```rust,ignore
//! use hydrocult::api::{serve, ApiConfig, AppState};
//! use hydrocult::storage::{StorageConfig, StorageEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(StorageEngine::open(&StorageConfig::default())?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(storage, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use identity::CurrentUser;
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Log routes
        .route(
            "/logs",
            get(routes::logs::list_logs).post(routes::logs::create_log),
        )
        .route("/logs/:id", delete(routes::logs::delete_log))
        .route("/progress", get(routes::progress::get_progress))
        // Goal and settings routes
        .route(
            "/goal",
            get(routes::goal::get_goal).put(routes::goal::set_goal),
        )
        .route(
            "/settings",
            get(routes::settings::get_settings).put(routes::settings::update_settings),
        )
        .route(
            "/notifications",
            get(routes::settings::get_notifications).put(routes::settings::update_notifications),
        )
        // Reminder routes
        .route(
            "/reminders",
            get(routes::reminders::get_reminders).put(routes::reminders::update_reminders),
        )
        .route("/reminders/times", post(routes::reminders::add_time))
        .route("/reminders/times/:time", delete(routes::reminders::remove_time))
        .route("/reminders/next", get(routes::reminders::get_next_reminder))
        // Report routes
        .route("/reports", get(routes::reports::get_report))
        .route("/achievements", get(routes::achievements::list_achievements))
        .route("/export", get(routes::export::export_logs))
        // Account routes
        .route("/account", delete(routes::account::delete_account))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let body_limit = state.config.max_body_size;

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Hydrocult API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Hydrocult API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
