//! Historical reports
//!
//! Logs are bucketed by calendar day in a single pass. A day is the date of
//! the timestamp after shifting it by a fixed UTC offset, so the same log
//! can land on different days for users in different zones.

use crate::storage::DrinkLog;
use crate::tracker::progress::goal_met;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Days with intake needed before a report is meaningful
pub const MIN_DAYS_WITH_DATA: usize = 3;

/// Weekend and weekday averages closer than this fraction read as consistent
const CONSISTENCY_TOLERANCE: f64 = 0.05;

/// Report window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReportRange {
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl ReportRange {
    pub fn days(&self) -> i64 {
        match self {
            ReportRange::Week => 7,
            ReportRange::Month => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportRange::Week => "7d",
            ReportRange::Month => "30d",
        }
    }
}

impl FromStr for ReportRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(ReportRange::Week),
            "30d" => Ok(ReportRange::Month),
            _ => Err(format!("Invalid range: {}. Use 7d or 30d", s)),
        }
    }
}

/// One point of the daily series
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayIntake {
    pub date: NaiveDate,
    pub intake: u32,
    pub goal: u32,
    pub goal_met: bool,
}

/// Aggregated report over a window ending today
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub range: ReportRange,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DayIntake>,
    pub average_intake: u32,
    pub goals_met: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Average minus goal, negative when below
    pub trend: i64,
    pub insight: String,
    pub enough_data: bool,
}

impl Report {
    /// Build a report from the logs of the window
    ///
    /// Logs outside the window are ignored, so callers may pass a wider
    /// slice than needed.
    pub fn build(
        logs: &[DrinkLog],
        goal: u32,
        today: NaiveDate,
        offset: FixedOffset,
        range: ReportRange,
    ) -> Self {
        let totals = daily_totals(logs, offset);
        let start = today - Duration::days(range.days() - 1);

        let days: Vec<DayIntake> = start
            .iter_days()
            .take(range.days() as usize)
            .map(|date| {
                let intake = totals.get(&date).copied().unwrap_or(0);
                DayIntake {
                    date,
                    intake,
                    goal,
                    goal_met: goal_met(intake, goal),
                }
            })
            .collect();

        let sum: u64 = days.iter().map(|d| d.intake as u64).sum();
        let average_intake = (sum as f64 / days.len() as f64).round() as u32;
        let goals_met = days.iter().filter(|d| d.goal_met).count() as u32;
        let days_with_data = days.iter().filter(|d| d.intake > 0).count();

        let longest_streak = days
            .iter()
            .fold((0u32, 0u32), |(run, best), d| {
                let run = if d.goal_met { run + 1 } else { 0 };
                (run, best.max(run))
            })
            .1;

        Self {
            range,
            start,
            end: today,
            current_streak: current_streak(&totals, goal, today, Some(start)),
            longest_streak,
            average_intake,
            goals_met,
            trend: average_intake as i64 - goal as i64,
            insight: weekly_insight(&days),
            enough_data: days_with_data >= MIN_DAYS_WITH_DATA,
            days,
        }
    }
}

/// Calendar date of a timestamp in the given offset
pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// UTC instant of a wall-clock time in the given offset
pub fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    (local - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
}

/// UTC bounds `[start, end)` of a local calendar day
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_to_utc(date.and_time(NaiveTime::MIN), offset);
    (start, start + Duration::days(1))
}

/// Like [`day_bounds`], `None` when either bound falls outside the calendar
pub fn checked_day_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = date
        .and_time(NaiveTime::MIN)
        .checked_sub_signed(Duration::seconds(offset.local_minus_utc() as i64))?
        .and_utc();
    let end = start.checked_add_signed(Duration::days(1))?;
    Some((start, end))
}

/// UTC bounds of the `days` local days ending with `today`
pub fn window_bounds(
    today: NaiveDate,
    days: i64,
    offset: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let (start, _) = day_bounds(today - Duration::days(days - 1), offset);
    let (_, end) = day_bounds(today, offset);
    (start, end)
}

/// Offset from a signed minute count, `None` when out of range
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Counted intake per local day
pub fn daily_totals(logs: &[DrinkLog], offset: FixedOffset) -> BTreeMap<NaiveDate, u32> {
    let mut totals = BTreeMap::new();
    for log in logs.iter().filter(|l| l.is_counted()) {
        let total = totals
            .entry(local_date(log.timestamp, offset))
            .or_insert(0u32);
        *total = total.saturating_add(log.amount);
    }
    totals
}

/// Consecutive goal-met days ending today
///
/// A day still in progress does not break the streak: when today is not yet
/// met, counting starts from yesterday. `floor` stops the walk at a window
/// start.
pub fn current_streak(
    totals: &BTreeMap<NaiveDate, u32>,
    goal: u32,
    today: NaiveDate,
    floor: Option<NaiveDate>,
) -> u32 {
    let met = |date: &NaiveDate| goal_met(totals.get(date).copied().unwrap_or(0), goal);

    let mut day = if met(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while floor.map_or(true, |f| day >= f) && met(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Whether the goal was met on each of the last 7 days, today included
pub fn perfect_week(totals: &BTreeMap<NaiveDate, u32>, goal: u32, today: NaiveDate) -> bool {
    (0..7).all(|back| {
        let date = today - Duration::days(back);
        goal_met(totals.get(&date).copied().unwrap_or(0), goal)
    })
}

/// Compare weekend and weekday averages
fn weekly_insight(days: &[DayIntake]) -> String {
    let (mut weekend_sum, mut weekend_n, mut weekday_sum, mut weekday_n) = (0u64, 0u64, 0u64, 0u64);

    for d in days {
        if matches!(d.date.weekday(), Weekday::Sat | Weekday::Sun) {
            weekend_sum += d.intake as u64;
            weekend_n += 1;
        } else {
            weekday_sum += d.intake as u64;
            weekday_n += 1;
        }
    }

    if weekend_n == 0 || weekday_n == 0 {
        return "Keep logging to see how your week shapes up.".to_string();
    }

    let weekend = weekend_sum as f64 / weekend_n as f64;
    let weekday = weekday_sum as f64 / weekday_n as f64;
    let larger = weekend.max(weekday);

    if larger == 0.0 || (weekend - weekday).abs() <= larger * CONSISTENCY_TOLERANCE {
        "You're consistent across the whole week.".to_string()
    } else if weekend > weekday {
        "Your intake is highest on weekends.".to_string()
    } else {
        "Your intake is highest during the week.".to_string()
    }
}
