//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::reminders::SchedulerConfig;
use crate::tracker::offset_from_minutes;
use crate::tracker::validation::parse_time_of_day;
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub reminders: RemindersConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("hydrocult").to_string_lossy().to_string())
        .unwrap_or_else(|| "./hydrocult_data".to_string())
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    #[serde(default = "default_true")]
    pub enable_export: bool,

    #[serde(default = "default_max_connections")]
    pub max_ws_connections: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1 MB
}

fn default_max_connections() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
            enable_export: true,
            max_ws_connections: default_max_connections(),
        }
    }
}

/// Where the caller's identity comes from
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Trusted header set by the identity provider in front of the service
    #[serde(default = "default_identity_header")]
    pub header: String,
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: default_identity_header(),
        }
    }
}

/// Day bucketing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerConfig {
    /// Offset from UTC used to cut days, overridable per request
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

/// Reminder scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_tick")]
    pub tick_secs: u64,

    /// Local `HH:MM` after which the missed-goal summary is sent
    #[serde(default = "default_summary_time")]
    pub summary_time: String,
}

fn default_tick() -> u64 {
    60
}

fn default_summary_time() -> String {
    "08:00".to_string()
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_secs: default_tick(),
            summary_time: default_summary_time(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("hydrocult").join("config.toml")),
            Some(PathBuf::from("/etc/hydrocult/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("HYDROCULT_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Ok(host) = std::env::var("HYDROCULT_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("HYDROCULT_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Ok(header) = std::env::var("HYDROCULT_IDENTITY_HEADER") {
            self.identity.header = header;
        }

        if let Ok(offset) = std::env::var("HYDROCULT_TZ_OFFSET_MINUTES") {
            if let Ok(m) = offset.parse() {
                self.tracker.tz_offset_minutes = m;
            }
        }

        if let Ok(enabled) = std::env::var("HYDROCULT_REMINDERS_ENABLED") {
            if let Ok(b) = enabled.parse() {
                self.reminders.enabled = b;
            }
        }

        if let Ok(level) = std::env::var("HYDROCULT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("HYDROCULT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz_offset()?;
        parse_time_of_day(&self.reminders.summary_time)
            .map_err(|e| ConfigError::Invalid(format!("reminders.summary_time: {}", e.message)))?;

        if self.reminders.tick_secs == 0 {
            return Err(ConfigError::Invalid(
                "reminders.tick_secs must be positive".to_string(),
            ));
        }
        if self.identity.header.trim().is_empty() {
            return Err(ConfigError::Invalid("identity.header is empty".to_string()));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be pretty or json, got {}",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Default day offset
    pub fn tz_offset(&self) -> Result<FixedOffset, ConfigError> {
        offset_from_minutes(self.tracker.tz_offset_minutes).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "tracker.tz_offset_minutes out of range: {}",
                self.tracker.tz_offset_minutes
            ))
        })
    }

    pub fn storage_config(&self) -> crate::storage::StorageConfig {
        crate::storage::StorageConfig {
            data_dir: PathBuf::from(&self.storage.data_dir),
            busy_timeout_ms: self.storage.busy_timeout_ms,
        }
    }

    pub fn api_config(&self) -> crate::api::ApiConfig {
        crate::api::ApiConfig {
            host: self.api.host.clone(),
            port: self.api.port,
            request_timeout_ms: self.api.request_timeout_secs * 1000,
            max_body_size: self.api.max_body_size,
            enable_export: self.api.enable_export,
            cors_origins: self.api.cors_origins.clone(),
            identity_header: self.identity.header.to_lowercase(),
            tz_offset_minutes: self.tracker.tz_offset_minutes,
        }
    }

    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        let summary_time = parse_time_of_day(&self.reminders.summary_time)
            .map_err(|e| ConfigError::Invalid(format!("reminders.summary_time: {}", e.message)))?;

        Ok(SchedulerConfig {
            tick: std::time::Duration::from_secs(self.reminders.tick_secs),
            summary_time,
            offset: self.tz_offset()?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Hydrocult Configuration
#
# Environment variables override these settings:
# - HYDROCULT_DATA_DIR
# - HYDROCULT_API_HOST
# - HYDROCULT_API_PORT
# - HYDROCULT_IDENTITY_HEADER
# - HYDROCULT_TZ_OFFSET_MINUTES
# - HYDROCULT_REMINDERS_ENABLED
# - HYDROCULT_LOG_LEVEL
# - HYDROCULT_LOG_FORMAT

[storage]
# Directory holding the SQLite database
data_dir = "~/.local/share/hydrocult"

# How long to wait on a locked database (ms)
busy_timeout_ms = 5000

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins (empty allows any)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

# Maximum request body size (bytes)
max_body_size = 1048576

# Enable the export endpoint
enable_export = true

# Maximum concurrent WebSocket connections
max_ws_connections = 1000

[identity]
# Header carrying the authenticated user id, set by your gateway
header = "x-user-id"

[tracker]
# Offset from UTC (minutes) used to decide which day a drink belongs to.
# Requests may override it with ?tz_offset_minutes=
tz_offset_minutes = 0

[reminders]
# Run the background reminder scheduler
enabled = true

# How often users are checked (seconds)
tick_secs = 60

# Local time after which yesterday's missed-goal summary is sent
summary_time = "08:00"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/hydrocult/hydrocult.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.identity.header, "x-user-id");
        assert_eq!(config.reminders.summary_time, "08:00");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [tracker]
            tz_offset_minutes = -300

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.tracker.tz_offset_minutes, -300);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.api.port, 8090);
        assert!(config.reminders.enabled);
        assert_eq!(config.tz_offset().unwrap().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.reminders.summary_time = "8am".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.tracker.tz_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nport = 9999\n[identity]\nheader = \"X-Auth-User\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.port, 9999);
        assert_eq!(config.api_config().identity_header, "x-auth-user");

        let err = Config::load(Path::new("/nonexistent/hydrocult.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides_file_offset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tracker]\ntz_offset_minutes = 120").unwrap();

        std::env::set_var("HYDROCULT_TZ_OFFSET_MINUTES", "-300");
        let overridden = Config::load_with_env(file.path());
        std::env::set_var("HYDROCULT_TZ_OFFSET_MINUTES", "not-a-number");
        let unparsable = Config::load_with_env(file.path());
        std::env::remove_var("HYDROCULT_TZ_OFFSET_MINUTES");

        let config = overridden.unwrap();
        assert_eq!(config.tracker.tz_offset_minutes, -300);
        assert_eq!(config.tz_offset().unwrap().local_minus_utc(), -300 * 60);
        assert_eq!(config.scheduler_config().unwrap().offset.local_minus_utc(), -300 * 60);

        // A bad value keeps the file setting
        assert_eq!(unparsable.unwrap().tracker.tz_offset_minutes, 120);
        assert_eq!(Config::load(file.path()).unwrap().tracker.tz_offset_minutes, 120);
    }

    #[test]
    fn test_scheduler_config() {
        let mut config = Config::default();
        config.reminders.tick_secs = 30;
        config.tracker.tz_offset_minutes = 60;

        let scheduler = config.scheduler_config().unwrap();
        assert_eq!(scheduler.tick, std::time::Duration::from_secs(30));
        assert_eq!(scheduler.offset.local_minus_utc(), 3600);
    }
}
