//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::api::error::{ApiError, ApiResult};
use crate::reminders::{HubNotifier, Notifier, ReminderScheduler};
use crate::storage::StorageEngine;
use crate::tracker::{checked_day_bounds, offset_from_minutes};
use crate::websocket::{ConnectionHub, HubConfig};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Logs and per-user documents
    pub storage: Arc<StorageEngine>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for real-time updates
    pub ws_hub: Arc<ConnectionHub>,
    /// Where goal and streak alerts go
    pub notifier: Arc<dyn Notifier>,
    /// Background reminder scheduler, when running
    pub scheduler: Option<Arc<ReminderScheduler>>,
}

impl AppState {
    /// Create state with a default hub; alerts go through the hub
    pub fn new(storage: Arc<StorageEngine>, config: ApiConfig) -> Self {
        Self::with_ws_config(storage, config, HubConfig::default())
    }

    /// Create AppState with custom WebSocket hub configuration
    pub fn with_ws_config(
        storage: Arc<StorageEngine>,
        config: ApiConfig,
        hub_config: HubConfig,
    ) -> Self {
        let ws_hub = Arc::new(ConnectionHub::new(hub_config));
        Self {
            storage,
            config: Arc::new(config),
            start_time: Instant::now(),
            notifier: Arc::new(HubNotifier::new(Arc::clone(&ws_hub))),
            ws_hub,
            scheduler: None,
        }
    }

    /// Replace the alert notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Attach the reminder scheduler so writes can reschedule reminders
    pub fn with_scheduler(mut self, scheduler: Arc<ReminderScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }

    /// Day offset for a request, falling back to the configured default
    pub fn offset(&self, override_minutes: Option<i32>) -> ApiResult<FixedOffset> {
        let minutes = override_minutes.unwrap_or(self.config.tz_offset_minutes);
        offset_from_minutes(minutes).ok_or_else(|| {
            ApiError::Validation(format!("tz_offset_minutes out of range: {}", minutes))
        })
    }

    /// UTC window of a local day, rejecting dates at the edge of the calendar
    pub fn day_window(
        &self,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
        checked_day_bounds(date, offset)
            .ok_or_else(|| ApiError::Validation(format!("date out of range: {}", date)))
    }

    /// Recompute the user's next reminder on the next scheduler tick
    pub async fn reschedule(&self, user_id: &str) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.reschedule(user_id).await;
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable data export endpoint
    pub enable_export: bool,
    /// Allowed CORS origins, empty for any
    pub cors_origins: Vec<String>,
    /// Lowercase name of the trusted identity header
    pub identity_header: String,
    /// Default day offset from UTC
    pub tz_offset_minutes: i32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            request_timeout_ms: 30_000,
            max_body_size: 1024 * 1024,
            enable_export: true,
            cors_origins: Vec::new(),
            identity_header: "x-user-id".to_string(),
            tz_offset_minutes: 0,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
