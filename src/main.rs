//! Hydrocult Server
//!
//! Run with: cargo run --bin hydrocult -- --config config.toml
//!
//! Without `--config` the default locations are searched, then
//! `HYDROCULT_*` environment variables are applied. `RUST_LOG` overrides
//! the configured log level.

use anyhow::Context;
use clap::Parser;
use hydrocult::api::{serve, AppState};
use hydrocult::config::{Config, LoggingConfig};
use hydrocult::reminders::ReminderScheduler;
use hydrocult::storage::StorageEngine;
use hydrocult::websocket::HubConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

#[derive(Parser)]
#[command(name = "hydrocult")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hydrocult water-intake tracking server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "HYDROCULT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    config.validate()?;

    init_logging(&config.logging)?;

    tracing::info!("Starting Hydrocult server v{}", env!("CARGO_PKG_VERSION"));

    // Initialize storage engine
    let storage_config = config.storage_config();
    tracing::info!("Data directory: {:?}", storage_config.data_dir);
    let storage = Arc::new(
        StorageEngine::open(&storage_config)
            .with_context(|| format!("Failed to open storage in {:?}", storage_config.data_dir))?,
    );

    match storage.stats().await {
        Ok(stats) => tracing::info!("Storage stats: {}", stats),
        Err(e) => tracing::warn!(error = %e, "Could not read storage stats"),
    }

    let api_config = config.api_config();
    let hub_config = HubConfig {
        max_connections: config.api.max_ws_connections,
        ..Default::default()
    };
    let mut state = AppState::with_ws_config(Arc::clone(&storage), api_config.clone(), hub_config);

    // Start the reminder scheduler if enabled
    let scheduler = if config.reminders.enabled {
        let scheduler = Arc::new(ReminderScheduler::new(
            Arc::clone(&storage),
            Arc::clone(&state.notifier),
            config.scheduler_config()?,
        ));
        let handle = Arc::clone(&scheduler).start();
        state = state.with_scheduler(Arc::clone(&scheduler));
        Some((scheduler, handle))
    } else {
        tracing::info!("Reminder scheduler disabled");
        None
    };

    tracing::info!(
        identity_header = %api_config.identity_header,
        "Starting server on {}",
        api_config.addr()
    );
    serve(state, &api_config).await?;

    // Graceful shutdown
    if let Some((scheduler, handle)) = scheduler {
        scheduler.stop().await;
        handle.abort();
    }

    tracing::info!("Hydrocult server stopped");
    Ok(())
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `[logging].level`. Output goes to stdout unless
/// `[logging].file` is set.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("hydrocult={},tower_http=info", config.level))
    });

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format.as_str() {
        "json" => fmt::layer().json().with_writer(writer).boxed(),
        _ => fmt::layer().with_ansi(ansi).with_writer(writer).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
