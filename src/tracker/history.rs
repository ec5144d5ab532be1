//! Recent history of a user, loaded once per write and shared by the
//! achievement and alert checks.

use crate::storage::{DailyGoal, StorageEngine, StorageResult};
use crate::tracker::progress::goal_met;
use crate::tracker::reports::{current_streak, daily_totals, local_date, perfect_week, window_bounds};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Days of history loaded to evaluate streaks
pub const HISTORY_LOOKBACK_DAYS: i64 = 60;

#[derive(Debug, Clone)]
pub struct History {
    pub today: NaiveDate,
    pub goal: u32,
    pub totals: BTreeMap<NaiveDate, u32>,
    pub log_count: u64,
}

impl History {
    pub async fn load(
        storage: &StorageEngine,
        user_id: &str,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> StorageResult<Self> {
        let today = local_date(now, offset);
        let (start, end) = window_bounds(today, HISTORY_LOOKBACK_DAYS, offset);

        let logs = storage.logs_in_range(user_id, start, end).await?;
        let goal: DailyGoal = storage.load(user_id).await?;

        Ok(Self {
            today,
            goal: goal.amount,
            totals: daily_totals(&logs, offset),
            log_count: storage.log_count(user_id).await?,
        })
    }

    pub fn total_on(&self, date: NaiveDate) -> u32 {
        self.totals.get(&date).copied().unwrap_or(0)
    }

    pub fn today_total(&self) -> u32 {
        self.total_on(self.today)
    }

    pub fn goal_met_on(&self, date: NaiveDate) -> bool {
        goal_met(self.total_on(date), self.goal)
    }

    pub fn current_streak(&self) -> u32 {
        current_streak(&self.totals, self.goal, self.today, None)
    }

    pub fn perfect_week(&self) -> bool {
        perfect_week(&self.totals, self.goal, self.today)
    }
}
