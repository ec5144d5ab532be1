//! Hydration reminders and alerts
//!
//! - **schedule**: Computes when the next reminder is due
//! - **alert**: Alert kinds and the alerts a new log triggers
//! - **notifier**: Delivery seam; the server pushes through the WebSocket hub
//! - **scheduler**: Background task firing due reminders and summaries

pub mod alert;
pub mod notifier;
pub mod schedule;
pub mod scheduler;

pub use alert::{log_write_alerts, Alert, STREAK_MILESTONES};
pub use notifier::{HubNotifier, Notifier};
pub use schedule::{in_quiet_hours, next_reminder, skip_quiet_hours};
pub use scheduler::{ReminderScheduler, SchedulerConfig};
