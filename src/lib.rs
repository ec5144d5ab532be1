//! # Hydrocult
//!
//! Water-intake tracking service. Users log drinks, set a daily goal,
//! follow their progress and streaks, and receive hydration reminders.
//!
//! ## Modules
//!
//! - [`storage`]: SQLite-backed logs, per-user documents and achievements
//! - [`tracker`]: Validation, daily progress, reports and achievements
//! - [`reminders`]: Reminder schedule, alerts and the background scheduler
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Per-user realtime updates
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hydrocult::storage::*;
//! use hydrocult::tracker::DailyProgress;
//! use chrono::Utc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = StorageEngine::open(&StorageConfig::default())?;
//!
//!     engine.insert_log("alice", &DrinkLog::new(250, DrinkType::Water)).await?;
//!
//!     let logs = engine.all_logs("alice").await?;
//!     let goal: DailyGoal = engine.load("alice").await?;
//!     let progress = DailyProgress::compute(Utc::now().date_naive(), &logs, goal.amount);
//!
//!     println!("{}", progress.summary(Units::Ml));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod reminders;
pub mod storage;
pub mod tracker;
pub mod websocket;

// Re-export top-level types for convenience
pub use storage::{
    DailyGoal, DrinkLog, DrinkType, LogStatus, NotificationSettings, ReminderSettings,
    StorageConfig, StorageEngine, StorageError, StorageResult, StorageStats, UserSettings,
};

pub use tracker::{DailyProgress, History, Report, ReportRange, ValidationError};

pub use reminders::{Alert, Notifier, ReminderScheduler, SchedulerConfig};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent,
};

pub use config::{
    ApiConfig as ConfigApiConfig, Config, ConfigError, LoggingConfig,
    StorageConfig as ConfigStorageConfig,
};
