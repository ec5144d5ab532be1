//! Reminder Scheduler
//!
//! Background task that checks every known user on a fixed tick and fires
//! the reminders and daily summaries that are due.

use crate::reminders::alert::Alert;
use crate::reminders::notifier::Notifier;
use crate::reminders::schedule::next_reminder;
use crate::storage::{
    DailyGoal, NotificationSettings, ReminderSettings, StorageEngine, StorageResult,
};
use crate::tracker::progress::{goal_met, total_intake};
use crate::tracker::reports::day_bounds;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often users are checked
    pub tick: std::time::Duration,
    /// Local time after which yesterday's missed-goal summary goes out
    pub summary_time: NaiveTime,
    /// Offset used to read wall-clock times
    pub offset: FixedOffset,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: std::time::Duration::from_secs(60),
            summary_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            offset: Utc.fix(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct UserState {
    next_due: Option<DateTime<Utc>>,
    last_summary: Option<NaiveDate>,
    /// Bumped by `reschedule` so an in-flight check does not restore a stale due time
    epoch: u64,
}

/// Fires reminders and summaries for every known user
pub struct ReminderScheduler {
    storage: Arc<StorageEngine>,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
    users: RwLock<HashMap<String, UserState>>,
    running: Arc<RwLock<bool>>,
}

impl ReminderScheduler {
    pub fn new(
        storage: Arc<StorageEngine>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            storage,
            notifier,
            config,
            users: RwLock::new(HashMap::new()),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the scheduler background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let scheduler = self.clone();

        tokio::spawn(async move {
            *scheduler.running.write().await = true;
            tracing::info!(tick_secs = scheduler.config.tick.as_secs(), "Reminder scheduler started");

            let mut interval = tokio::time::interval(scheduler.config.tick);

            loop {
                interval.tick().await;

                if !*scheduler.running.read().await {
                    break;
                }

                let sent = scheduler.tick(Utc::now()).await;
                if sent > 0 {
                    tracing::info!(alerts = sent, "Reminder tick delivered alerts");
                }
            }

            tracing::info!("Reminder scheduler stopped");
        })
    }

    /// Stop the scheduler
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Drop the cached due time so the next check recomputes it from the
    /// latest drink and current settings
    pub async fn reschedule(&self, user_id: &str) {
        let mut users = self.users.write().await;
        let state = users.entry(user_id.to_string()).or_default();
        state.next_due = None;
        state.epoch += 1;
        tracing::debug!(user_id = %user_id, "Reminder rescheduled");
    }

    /// Forget everything about a user
    pub async fn forget(&self, user_id: &str) {
        self.users.write().await.remove(user_id);
    }

    /// Cached due time, if one has been computed
    pub async fn next_due(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.users
            .read()
            .await
            .get(user_id)
            .and_then(|s| s.next_due)
    }

    /// Check every known user once, returning how many alerts were sent
    pub async fn tick(&self, now: DateTime<Utc>) -> usize {
        let users = match self.storage.known_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list users for reminders");
                return 0;
            }
        };

        let mut sent = 0;
        for user_id in users {
            match self.check_user(&user_id, now).await {
                Ok(n) => sent += n,
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Reminder check failed");
                }
            }
        }
        sent
    }

    async fn check_user(&self, user_id: &str, now: DateTime<Utc>) -> StorageResult<usize> {
        let reminders: ReminderSettings = self.storage.load(user_id).await?;
        let prefs: NotificationSettings = self.storage.load(user_id).await?;

        let mut state = self
            .users
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        let epoch = state.epoch;
        let mut sent = 0;

        if reminders.enabled && prefs.reminder_alerts {
            let due = match state.next_due {
                Some(due) => Some(due),
                None => {
                    let last_drink = self.storage.latest_log(user_id).await?.map(|l| l.timestamp);
                    next_reminder(&reminders, last_drink, now, self.config.offset)
                }
            };

            state.next_due = match due {
                Some(due) if now >= due => {
                    self.notifier
                        .notify(user_id, Alert::Reminder { due_at: due })
                        .await;
                    sent += 1;
                    next_reminder(&reminders, Some(now), now, self.config.offset)
                }
                other => other,
            };
        } else {
            state.next_due = None;
        }

        if prefs.missed_goal_summary {
            sent += self.check_summary(user_id, now, &mut state).await?;
        }

        let mut users = self.users.write().await;
        if let Some(stored) = users.get_mut(user_id) {
            if stored.epoch == epoch {
                stored.next_due = state.next_due;
            }
            stored.last_summary = state.last_summary;
            return Ok(sent);
        }

        // The map lock is held so a concurrent forget lands after this insert
        if self.storage.has_user(user_id).await? {
            users.insert(user_id.to_string(), state);
        } else {
            tracing::debug!(user_id = %user_id, "User deleted during reminder check");
        }

        Ok(sent)
    }

    /// Send yesterday's summary once per day if the goal was missed
    async fn check_summary(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        state: &mut UserState,
    ) -> StorageResult<usize> {
        let local = now.with_timezone(&self.config.offset);
        let today = local.date_naive();

        if local.time() < self.config.summary_time || state.last_summary == Some(today) {
            return Ok(0);
        }
        state.last_summary = Some(today);

        let yesterday = today - Duration::days(1);
        let (start, end) = day_bounds(yesterday, self.config.offset);
        let logs = self.storage.logs_in_range(user_id, start, end).await?;
        let goal: DailyGoal = self.storage.load(user_id).await?;
        let total = total_intake(&logs);

        if goal_met(total, goal.amount) {
            return Ok(0);
        }

        self.notifier
            .notify(
                user_id,
                Alert::MissedGoal {
                    date: yesterday,
                    total_ml: total,
                    goal_ml: goal.amount,
                },
            )
            .await;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::notifier::RecordingNotifier;
    use crate::storage::{DrinkLog, DrinkType, ReminderMode};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    async fn setup() -> (Arc<StorageEngine>, Arc<RecordingNotifier>, ReminderScheduler) {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = ReminderScheduler::new(
            Arc::clone(&storage),
            notifier.clone(),
            SchedulerConfig::default(),
        );
        (storage, notifier, scheduler)
    }

    #[tokio::test]
    async fn test_interval_reminder_fires_when_due() {
        let (storage, notifier, scheduler) = setup().await;
        storage
            .insert_log("alice", &DrinkLog::new(250, DrinkType::Water).at(at(1, 9, 0)))
            .await
            .unwrap();

        assert_eq!(scheduler.tick(at(1, 9, 30)).await, 0);
        assert_eq!(scheduler.next_due("alice").await, Some(at(1, 10, 0)));

        assert_eq!(scheduler.tick(at(1, 10, 0)).await, 1);
        let sent = notifier.take().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice");
        assert_eq!(sent[0].1, Alert::Reminder { due_at: at(1, 10, 0) });

        // Next one is an interval after the reminder
        assert_eq!(scheduler.next_due("alice").await, Some(at(1, 11, 0)));
        assert_eq!(scheduler.tick(at(1, 10, 30)).await, 0);
    }

    #[tokio::test]
    async fn test_new_drink_reschedules() {
        let (storage, _notifier, scheduler) = setup().await;
        storage
            .insert_log("alice", &DrinkLog::new(250, DrinkType::Water).at(at(1, 9, 0)))
            .await
            .unwrap();
        scheduler.tick(at(1, 9, 10)).await;
        assert_eq!(scheduler.next_due("alice").await, Some(at(1, 10, 0)));

        storage
            .insert_log("alice", &DrinkLog::new(250, DrinkType::Water).at(at(1, 9, 45)))
            .await
            .unwrap();
        scheduler.reschedule("alice").await;
        assert_eq!(scheduler.next_due("alice").await, None);

        assert_eq!(scheduler.tick(at(1, 10, 0)).await, 0);
        assert_eq!(scheduler.next_due("alice").await, Some(at(1, 10, 45)));
    }

    #[tokio::test]
    async fn test_deleted_user_is_not_cached_again() {
        let (storage, _notifier, scheduler) = setup().await;
        storage
            .insert_log("alice", &DrinkLog::new(250, DrinkType::Water).at(at(1, 9, 0)))
            .await
            .unwrap();
        scheduler.tick(at(1, 9, 10)).await;
        assert!(scheduler.users.read().await.contains_key("alice"));

        // A check for a user listed before the account was deleted
        storage.delete_user("alice").await.unwrap();
        scheduler.forget("alice").await;
        scheduler.check_user("alice", at(1, 9, 20)).await.unwrap();

        assert!(!scheduler.users.read().await.contains_key("alice"));
        assert_eq!(scheduler.next_due("alice").await, None);
    }

    #[tokio::test]
    async fn test_custom_mode_fires_at_listed_times() {
        let (storage, notifier, scheduler) = setup().await;
        let settings = ReminderSettings {
            mode: ReminderMode::Custom,
            custom_times: vec!["09:00".to_string(), "14:00".to_string()],
            ..Default::default()
        };
        storage.put_document("bob", &settings).await.unwrap();

        scheduler.tick(at(1, 8, 0)).await;
        assert_eq!(scheduler.next_due("bob").await, Some(at(1, 9, 0)));

        assert_eq!(scheduler.tick(at(1, 9, 1)).await, 1);
        assert_eq!(scheduler.next_due("bob").await, Some(at(1, 14, 0)));
        assert_eq!(notifier.take().await.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_reminders_do_not_fire() {
        let (storage, notifier, scheduler) = setup().await;
        storage
            .put_document(
                "alice",
                &ReminderSettings {
                    enabled: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(scheduler.tick(at(1, 9, 0)).await, 0);
        assert_eq!(scheduler.tick(at(2, 9, 0)).await, 0);
        assert!(notifier.take().await.is_empty());
        assert_eq!(scheduler.next_due("alice").await, None);
    }

    #[tokio::test]
    async fn test_reminder_alerts_flag_off() {
        let (storage, _notifier, scheduler) = setup().await;
        storage
            .put_document(
                "alice",
                &NotificationSettings {
                    reminder_alerts: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        scheduler.tick(at(1, 9, 0)).await;
        assert_eq!(scheduler.tick(at(1, 12, 0)).await, 0);
    }

    #[tokio::test]
    async fn test_missed_goal_summary_once_per_day() {
        let (storage, notifier, scheduler) = setup().await;
        storage
            .put_document(
                "alice",
                &NotificationSettings {
                    reminder_alerts: false,
                    missed_goal_summary: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        storage
            .insert_log("alice", &DrinkLog::new(1000, DrinkType::Water).at(at(1, 12, 0)))
            .await
            .unwrap();

        // Before the summary time nothing happens
        assert_eq!(scheduler.tick(at(2, 7, 0)).await, 0);

        assert_eq!(scheduler.tick(at(2, 8, 0)).await, 1);
        assert_eq!(scheduler.tick(at(2, 9, 0)).await, 0);

        let sent = notifier.take().await;
        assert_eq!(
            sent[0].1,
            Alert::MissedGoal {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                total_ml: 1000,
                goal_ml: 2500,
            }
        );
    }

    #[tokio::test]
    async fn test_no_summary_when_goal_met() {
        let (storage, notifier, scheduler) = setup().await;
        storage
            .put_document(
                "alice",
                &NotificationSettings {
                    reminder_alerts: false,
                    missed_goal_summary: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        storage
            .insert_log("alice", &DrinkLog::new(2500, DrinkType::Water).at(at(1, 12, 0)))
            .await
            .unwrap();

        assert_eq!(scheduler.tick(at(2, 8, 30)).await, 0);
        assert!(notifier.take().await.is_empty());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let (_storage, _notifier, scheduler) = setup().await;
        let scheduler = Arc::new(scheduler);

        let handle = Arc::clone(&scheduler).start();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(scheduler.is_running().await);

        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
        handle.abort();
    }
}
