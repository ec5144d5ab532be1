//! Alerts delivered to users

use crate::storage::NotificationSettings;
use crate::tracker::history::History;
use crate::tracker::progress::goal_crossed;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Streak lengths worth celebrating
pub const STREAK_MILESTONES: [u32; 4] = [3, 7, 14, 30];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// Time to drink
    Reminder { due_at: DateTime<Utc> },
    /// Today's total reached the goal
    GoalCompleted { total_ml: u32, goal_ml: u32 },
    /// The current streak reached a milestone
    StreakMilestone { days: u32 },
    /// Yesterday ended below the goal
    MissedGoal {
        date: NaiveDate,
        total_ml: u32,
        goal_ml: u32,
    },
}

impl Alert {
    pub fn title(&self) -> &'static str {
        match self {
            Alert::Reminder { .. } => "Time to hydrate",
            Alert::GoalCompleted { .. } => "Goal reached!",
            Alert::StreakMilestone { .. } => "Streak milestone",
            Alert::MissedGoal { .. } => "Daily summary",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Alert::Reminder { .. } => "Have a glass of water to stay on track.".to_string(),
            Alert::GoalCompleted { total_ml, goal_ml } => format!(
                "You've reached your daily goal: {} of {} ml.",
                total_ml, goal_ml
            ),
            Alert::StreakMilestone { days } => {
                format!("You've met your goal {} days in a row!", days)
            }
            Alert::MissedGoal {
                date,
                total_ml,
                goal_ml,
            } => format!(
                "On {} you drank {} of your {} ml goal. Today is a fresh start.",
                date, total_ml, goal_ml
            ),
        }
    }
}

/// Alerts triggered by a new log adding `added_ml` to today's total
///
/// `before_ml` is today's counted total read atomically with the insert.
/// Only a write that moves today from below the goal to at or above it can
/// complete the goal or extend the streak, so a log for another day yields
/// nothing. The streak is read from `history`, loaded after the write.
pub fn log_write_alerts(
    prefs: &NotificationSettings,
    history: &History,
    before_ml: u32,
    added_ml: u32,
) -> Vec<Alert> {
    let before = before_ml;
    let after = before_ml.saturating_add(added_ml);

    if !goal_crossed(before, after, history.goal) {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    if prefs.goal_completed {
        alerts.push(Alert::GoalCompleted {
            total_ml: after,
            goal_ml: history.goal,
        });
    }

    let streak = history.current_streak();
    if prefs.streak_milestones && STREAK_MILESTONES.contains(&streak) {
        alerts.push(Alert::StreakMilestone { days: streak });
    }

    alerts
}
