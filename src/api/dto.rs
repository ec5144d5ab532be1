//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::{
    DeletedRecords, DrinkLog, DrinkType, NotificationSettings, QuietHours, ReminderMode,
    ReminderSettings, Theme, Units, UserSettings,
};
use crate::tracker::{AchievementStatus, DailyProgress};

// ============================================
// LOG DTOs
// ============================================

/// Query for day-scoped endpoints
#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    /// Local calendar day, defaults to today
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Offset from UTC used to cut days, overrides the configured default
    #[serde(default)]
    pub tz_offset_minutes: Option<i32>,
}

/// Log a drink
#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    /// Amount in milliliters
    pub amount: u32,
    /// Defaults to water
    #[serde(default)]
    pub drink_type: Option<DrinkType>,
    /// Defaults to now
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Client-chosen id, makes retries idempotent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tz_offset_minutes: Option<i32>,
}

/// A log together with the advice shown for its drink type
#[derive(Debug, Serialize)]
pub struct LogResponse {
    #[serde(flatten)]
    pub log: DrinkLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<&'static str>,
}

impl From<DrinkLog> for LogResponse {
    fn from(log: DrinkLog) -> Self {
        let advice = crate::tracker::drink_advice(log.drink_type);
        Self { log, advice }
    }
}

/// Logs of one day
#[derive(Debug, Serialize)]
pub struct LogListResponse {
    pub date: NaiveDate,
    pub total_ml: u32,
    pub count: usize,
    pub logs: Vec<DrinkLog>,
}

/// Daily progress plus the user's display units
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: DailyProgress,
    pub units: Units,
    pub summary: String,
}

// ============================================
// GOAL & SETTINGS DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub amount: u32,
}

/// Partial update of display settings
#[derive(Debug, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub units: Option<Units>,
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut UserSettings) {
        if let Some(units) = self.units {
            settings.units = units;
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
    }
}

/// Partial update of notification flags
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsPatch {
    #[serde(default)]
    pub goal_completed: Option<bool>,
    #[serde(default)]
    pub reminder_alerts: Option<bool>,
    #[serde(default)]
    pub streak_milestones: Option<bool>,
    #[serde(default)]
    pub missed_goal_summary: Option<bool>,
}

impl NotificationsPatch {
    pub fn apply(self, settings: &mut NotificationSettings) {
        let fields = [
            (self.goal_completed, &mut settings.goal_completed),
            (self.reminder_alerts, &mut settings.reminder_alerts),
            (self.streak_milestones, &mut settings.streak_milestones),
            (self.missed_goal_summary, &mut settings.missed_goal_summary),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

// ============================================
// REMINDER DTOs
// ============================================

/// Partial update of the reminder schedule
///
/// `quiet_hours: null` clears the window, an absent key leaves it alone.
#[derive(Debug, Default, Deserialize)]
pub struct RemindersPatch {
    #[serde(default)]
    pub mode: Option<ReminderMode>,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(default)]
    pub custom_times: Option<Vec<String>>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub quiet_hours: Option<Option<QuietHours>>,
}

impl RemindersPatch {
    /// Merge into `settings`; the result still needs validating
    pub fn apply(self, settings: &mut ReminderSettings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(minutes) = self.interval_minutes {
            settings.interval_minutes = minutes;
        }
        if let Some(times) = self.custom_times {
            settings.custom_times = times;
        }
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(quiet_hours) = self.quiet_hours {
            settings.quiet_hours = quiet_hours;
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct AddTimeRequest {
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct NextReminderResponse {
    pub enabled: bool,
    pub mode: ReminderMode,
    /// `None` when reminders are off or no time is configured
    pub next_at: Option<DateTime<Utc>>,
}

impl NextReminderResponse {
    pub fn new(settings: &ReminderSettings, next_at: Option<DateTime<Utc>>) -> Self {
        Self {
            enabled: settings.enabled,
            mode: settings.mode,
            next_at,
        }
    }
}

// ============================================
// REPORT DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// `7d` or `30d`, defaults to `7d`
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub unlocked: usize,
    pub total: usize,
    pub achievements: Vec<AchievementStatus>,
}

// ============================================
// EXPORT & ACCOUNT DTOs
// ============================================

/// Export parameters
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// Output format: csv or json
    #[serde(default = "default_export_format")]
    pub format: String,
}

fn default_export_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    /// Must be the literal `DELETE`
    pub confirm: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub status: String,
    pub deleted: DeletedRecords,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", "unhealthy"
    pub status: String,
    /// Storage status
    pub storage: String,
    /// Reminder scheduler status: "running", "stopped", "disabled"
    pub scheduler: String,
    /// Open WebSocket connections
    pub websocket_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminders_patch_quiet_hours() {
        let absent: RemindersPatch = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert_eq!(absent.quiet_hours, None);

        let cleared: RemindersPatch = serde_json::from_str(r#"{"quiet_hours": null}"#).unwrap();
        assert_eq!(cleared.quiet_hours, Some(None));

        let set: RemindersPatch =
            serde_json::from_str(r#"{"quiet_hours": {"start": "22:00", "end": "07:00"}}"#)
                .unwrap();
        assert!(matches!(set.quiet_hours, Some(Some(ref q)) if q.start == "22:00"));
    }

    #[test]
    fn test_notifications_patch_merges() {
        let mut settings = NotificationSettings::default();
        let patch: NotificationsPatch =
            serde_json::from_str(r#"{"missed_goal_summary": true}"#).unwrap();
        patch.apply(&mut settings);

        assert!(settings.missed_goal_summary);
        assert!(settings.goal_completed);
    }

    #[test]
    fn test_log_response_advice() {
        let coffee = LogResponse::from(DrinkLog::new(200, DrinkType::Coffee));
        assert!(coffee.advice.is_some());

        let water = serde_json::to_value(LogResponse::from(DrinkLog::new(200, DrinkType::Water)))
            .unwrap();
        assert!(water.get("advice").is_none());
        assert_eq!(water["amount"], 200);
    }
}
