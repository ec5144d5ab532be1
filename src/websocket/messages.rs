//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! clients and the Hydrocult server.

use crate::reminders::Alert;
use crate::storage::{DailyGoal, DrinkLog, NotificationSettings, ReminderSettings, UserSettings};
use crate::tracker::Achievement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topics a client may subscribe to; `*` matches all of them
pub const TOPICS: [&str; 7] = [
    "logs",
    "goal",
    "settings",
    "notifications",
    "reminders",
    "achievements",
    "alerts",
];

pub const WILDCARD_TOPIC: &str = "*";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// List of topics to subscribe to (e.g., "logs", "*")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A drink was logged
    LogCreated { log: DrinkLog },
    /// A drink log was removed
    LogDeleted { id: String },
    GoalUpdated { goal: DailyGoal },
    SettingsUpdated { settings: UserSettings },
    NotificationsUpdated { notifications: NotificationSettings },
    RemindersUpdated { reminders: ReminderSettings },
    /// A milestone was reached for the first time
    AchievementUnlocked {
        achievement: Achievement,
        unlocked_at: DateTime<Utc>,
    },
    /// Something the user should be told about
    Alert {
        alert: Alert,
        title: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Subscription confirmed
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
    /// Connection established
    Connected {
        connection_id: String,
        user_id: String,
    },
}

/// Internal event for broadcasting through the hub
///
/// Events are scoped to the user that owns the data; the hub never delivers
/// them to another user's connections.
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub user_id: String,
    pub topic: String,
    pub message: ServerMessage,
}

impl WsEvent {
    fn new(user_id: &str, topic: &str, message: ServerMessage) -> Self {
        Self {
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            message,
        }
    }

    pub fn log_created(user_id: &str, log: DrinkLog) -> Self {
        Self::new(user_id, "logs", ServerMessage::LogCreated { log })
    }

    pub fn log_deleted(user_id: &str, id: &str) -> Self {
        Self::new(
            user_id,
            "logs",
            ServerMessage::LogDeleted { id: id.to_string() },
        )
    }

    pub fn goal_updated(user_id: &str, goal: DailyGoal) -> Self {
        Self::new(user_id, "goal", ServerMessage::GoalUpdated { goal })
    }

    pub fn settings_updated(user_id: &str, settings: UserSettings) -> Self {
        Self::new(
            user_id,
            "settings",
            ServerMessage::SettingsUpdated { settings },
        )
    }

    pub fn notifications_updated(user_id: &str, notifications: NotificationSettings) -> Self {
        Self::new(
            user_id,
            "notifications",
            ServerMessage::NotificationsUpdated { notifications },
        )
    }

    pub fn reminders_updated(user_id: &str, reminders: ReminderSettings) -> Self {
        Self::new(
            user_id,
            "reminders",
            ServerMessage::RemindersUpdated { reminders },
        )
    }

    pub fn achievement_unlocked(
        user_id: &str,
        achievement: Achievement,
        unlocked_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            "achievements",
            ServerMessage::AchievementUnlocked {
                achievement,
                unlocked_at,
            },
        )
    }

    pub fn alert(user_id: &str, alert: Alert) -> Self {
        let title = alert.title().to_string();
        let message = alert.message();
        Self::new(
            user_id,
            "alerts",
            ServerMessage::Alert {
                alert,
                title,
                message,
                timestamp: Utc::now(),
            },
        )
    }
}
