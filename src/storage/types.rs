//! Core data types for the Hydrocult storage layer
//!
//! This module defines the records kept per user:
//! - `DrinkLog`: A single logged drink
//! - `DailyGoal`, `ReminderSettings`, `NotificationSettings`, `UserSettings`:
//!   flat documents overwritten in place
//! - `UnlockedAchievement`: A milestone the user has reached

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;

/// Goal used until the user sets one
pub const DEFAULT_DAILY_GOAL_ML: u32 = 2500;

/// What was consumed
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum DrinkType {
    #[default]
    Water,
    Coffee,
    Tea,
    Juice,
}

impl DrinkType {
    /// Get all drink types for iteration
    pub fn all() -> &'static [DrinkType] {
        &[
            DrinkType::Water,
            DrinkType::Coffee,
            DrinkType::Tea,
            DrinkType::Juice,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrinkType::Water => "water",
            DrinkType::Coffee => "coffee",
            DrinkType::Tea => "tea",
            DrinkType::Juice => "juice",
        }
    }
}

impl std::fmt::Display for DrinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "water" => Ok(DrinkType::Water),
            "coffee" => Ok(DrinkType::Coffee),
            "tea" => Ok(DrinkType::Tea),
            "juice" => Ok(DrinkType::Juice),
            _ => Err(format!(
                "Invalid drink type: {}. Use water, coffee, tea, or juice",
                s
            )),
        }
    }
}

/// Sync state of a log as seen by a client
///
/// Everything persisted by the service is `Synced`. `Pending` and `Error`
/// describe optimistic entries a client has not yet confirmed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Pending,
    #[default]
    Synced,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Pending => "pending",
            LogStatus::Synced => "synced",
            LogStatus::Error => "error",
        }
    }
}

impl FromStr for LogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LogStatus::Pending),
            "synced" => Ok(LogStatus::Synced),
            "error" => Ok(LogStatus::Error),
            _ => Err(format!("Invalid log status: {}", s)),
        }
    }
}

/// A single logged drink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrinkLog {
    /// Unique identifier (UUID, or supplied by the client for retries)
    pub id: String,
    /// Amount in milliliters
    pub amount: u32,
    /// What was consumed
    #[serde(default)]
    pub drink_type: DrinkType,
    /// When the drink was logged
    pub timestamp: DateTime<Utc>,
    /// Sync state
    #[serde(default)]
    pub status: LogStatus,
}

impl DrinkLog {
    /// Create a new log stamped with the current time
    pub fn new(amount: u32, drink_type: DrinkType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            amount,
            drink_type,
            timestamp: Utc::now(),
            status: LogStatus::Synced,
        }
    }

    /// Builder method: set timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builder method: use a client-supplied id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder method: set status
    pub fn with_status(mut self, status: LogStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether this log counts towards intake totals
    pub fn is_counted(&self) -> bool {
        self.status == LogStatus::Synced
    }
}

/// A flat per-user document stored under `collection/doc_id`
pub trait Document: Serialize + DeserializeOwned + Default + Send + Sync {
    /// Collection name, mirroring `users/{uid}/{collection}/{doc_id}`
    const COLLECTION: &'static str;
    /// Document id within the collection
    const DOC_ID: &'static str = "main";
}

/// Daily intake goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyGoal {
    /// Goal in milliliters
    pub amount: u32,
}

impl Default for DailyGoal {
    fn default() -> Self {
        Self {
            amount: DEFAULT_DAILY_GOAL_ML,
        }
    }
}

impl Document for DailyGoal {
    const COLLECTION: &'static str = "dailyGoals";
}

/// How reminders are scheduled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMode {
    /// Every N minutes since the last drink
    #[default]
    Interval,
    /// At fixed times of day
    Custom,
}

impl FromStr for ReminderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interval" => Ok(ReminderMode::Interval),
            "custom" => Ok(ReminderMode::Custom),
            _ => Err(format!("Invalid reminder mode: {}. Use interval or custom", s)),
        }
    }
}

/// Window during which no reminders fire, `HH:MM` bounds, may wrap midnight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuietHours {
    pub start: String,
    pub end: String,
}

/// Reminder schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderSettings {
    #[serde(default)]
    pub mode: ReminderMode,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    /// Sorted, unique `HH:MM` strings
    #[serde(default)]
    pub custom_times: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,
}

fn default_interval_minutes() -> u32 {
    60
}

fn default_enabled() -> bool {
    true
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            mode: ReminderMode::Interval,
            interval_minutes: default_interval_minutes(),
            custom_times: ["09:00", "11:30", "14:00", "16:30"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            enabled: default_enabled(),
            quiet_hours: None,
        }
    }
}

impl Document for ReminderSettings {
    const COLLECTION: &'static str = "reminders";
}

/// Which events the user wants to hear about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSettings {
    /// Notify when the daily goal is reached
    pub goal_completed: bool,
    /// Deliver hydration reminders
    pub reminder_alerts: bool,
    /// Celebrate streak milestones
    pub streak_milestones: bool,
    /// Daily summary when the goal was missed
    pub missed_goal_summary: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            goal_completed: true,
            reminder_alerts: true,
            streak_milestones: true,
            missed_goal_summary: false,
        }
    }
}

impl Document for NotificationSettings {
    const COLLECTION: &'static str = "notifications";
}

/// Display units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Ml,
    Oz,
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ml" => Ok(Units::Ml),
            "oz" => Ok(Units::Oz),
            _ => Err(format!("Invalid units: {}. Use ml or oz", s)),
        }
    }
}

/// Colour theme
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Invalid theme: {}. Use system, light, or dark", s)),
        }
    }
}

/// Display preferences
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserSettings {
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub theme: Theme,
}

impl Document for UserSettings {
    const COLLECTION: &'static str = "settings";
}

/// An achievement the user has unlocked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drink_type_parse() {
        assert_eq!("coffee".parse::<DrinkType>(), Ok(DrinkType::Coffee));
        assert_eq!("WATER".parse::<DrinkType>(), Ok(DrinkType::Water));
        assert!("soda".parse::<DrinkType>().is_err());
    }

    #[test]
    fn test_drink_log_defaults_to_synced_water() {
        let json = r#"{"id": "a", "amount": 250, "timestamp": "2024-06-01T08:00:00Z"}"#;
        let log: DrinkLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.drink_type, DrinkType::Water);
        assert_eq!(log.status, LogStatus::Synced);
        assert!(log.is_counted());
    }

    #[test]
    fn test_pending_log_not_counted() {
        let log = DrinkLog::new(250, DrinkType::Tea).with_status(LogStatus::Pending);
        assert!(!log.is_counted());
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"drink_type\":\"tea\""));
    }

    #[test]
    fn test_reminder_defaults() {
        let settings = ReminderSettings::default();
        assert_eq!(settings.mode, ReminderMode::Interval);
        assert_eq!(settings.interval_minutes, 60);
        assert_eq!(settings.custom_times.len(), 4);
        assert!(settings.enabled);

        // Partial documents fill in defaults
        let parsed: ReminderSettings = serde_json::from_str(r#"{"mode": "custom"}"#).unwrap();
        assert_eq!(parsed.mode, ReminderMode::Custom);
        assert_eq!(parsed.interval_minutes, 60);
        assert!(parsed.custom_times.is_empty());
    }

    #[test]
    fn test_notification_defaults() {
        let settings = NotificationSettings::default();
        assert!(settings.goal_completed);
        assert!(settings.reminder_alerts);
        assert!(settings.streak_milestones);
        assert!(!settings.missed_goal_summary);
    }

    #[test]
    fn test_document_collections() {
        assert_eq!(DailyGoal::COLLECTION, "dailyGoals");
        assert_eq!(UserSettings::COLLECTION, "settings");
        assert_eq!(DailyGoal::DOC_ID, "main");
        assert_eq!(DailyGoal::default().amount, DEFAULT_DAILY_GOAL_ML);
    }
}
