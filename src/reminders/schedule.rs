//! When is the next reminder due?

use crate::storage::{QuietHours, ReminderMode, ReminderSettings};
use crate::tracker::reports::local_to_utc;
use crate::tracker::validation::parse_time_of_day;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};

/// Next reminder instant, or `None` when reminders are off
///
/// In interval mode the reminder is due `interval_minutes` after
/// `last_drink`, or after `now` when nothing was drunk yet. In custom mode
/// it is the first listed time strictly after `now`, rolling over to the
/// first time of the next day. Wall-clock times are read in `offset`.
/// A result inside quiet hours is pushed to the end of the window.
pub fn next_reminder(
    settings: &ReminderSettings,
    last_drink: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    if !settings.enabled {
        return None;
    }

    let due = match settings.mode {
        ReminderMode::Interval => {
            last_drink.unwrap_or(now) + Duration::minutes(settings.interval_minutes as i64)
        }
        ReminderMode::Custom => next_custom_time(&settings.custom_times, now, offset)?,
    };

    Some(match &settings.quiet_hours {
        Some(quiet) => skip_quiet_hours(due, quiet, offset),
        None => due,
    })
}

fn next_custom_time(
    times: &[String],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let mut parsed: Vec<NaiveTime> = times
        .iter()
        .filter_map(|t| parse_time_of_day(t).ok())
        .collect();
    parsed.sort();

    let local_now = now.with_timezone(&offset).naive_local();
    let today = local_now.date();

    let next = parsed
        .iter()
        .map(|t| today.and_time(*t))
        .find(|at| *at > local_now)
        .or_else(|| {
            parsed
                .first()
                .map(|t| (today + Duration::days(1)).and_time(*t))
        })?;

    Some(local_to_utc(next, offset))
}

/// Whether `time` falls in `[start, end)`, wrapping midnight when `start > end`
pub fn in_quiet_hours(time: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start < end {
        time >= start && time < end
    } else {
        time >= start || time < end
    }
}

/// Move an instant inside quiet hours to the end of the window
pub fn skip_quiet_hours(
    due: DateTime<Utc>,
    quiet: &QuietHours,
    offset: FixedOffset,
) -> DateTime<Utc> {
    let (Ok(start), Ok(end)) = (parse_time_of_day(&quiet.start), parse_time_of_day(&quiet.end))
    else {
        return due;
    };

    let local = due.with_timezone(&offset).naive_local();
    let time = local.time();
    if !in_quiet_hours(time, start, end) {
        return due;
    }

    let date = if time < end {
        local.date()
    } else {
        local.date() + Duration::days(1)
    };
    local_to_utc(date.and_time(end), offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn custom(times: &[&str]) -> ReminderSettings {
        ReminderSettings {
            mode: ReminderMode::Custom,
            custom_times: times.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn quiet(start: &str, end: &str) -> Option<QuietHours> {
        Some(QuietHours {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    #[test]
    fn test_interval_from_last_drink() {
        let settings = ReminderSettings {
            interval_minutes: 90,
            ..Default::default()
        };
        let next = next_reminder(&settings, Some(at(1, 10, 0)), at(1, 10, 30), utc());
        assert_eq!(next, Some(at(1, 11, 30)));
    }

    #[test]
    fn test_interval_without_drink_uses_now() {
        let settings = ReminderSettings::default();
        let next = next_reminder(&settings, None, at(1, 10, 15), utc());
        assert_eq!(next, Some(at(1, 11, 15)));
    }

    #[test]
    fn test_custom_next_time_today() {
        let settings = custom(&["14:00", "09:00", "11:30"]);
        assert_eq!(
            next_reminder(&settings, None, at(1, 10, 0), utc()),
            Some(at(1, 11, 30))
        );
        // Strictly after now
        assert_eq!(
            next_reminder(&settings, None, at(1, 11, 30), utc()),
            Some(at(1, 14, 0))
        );
    }

    #[test]
    fn test_custom_rolls_over_to_tomorrow() {
        let settings = custom(&["09:00", "14:00"]);
        assert_eq!(
            next_reminder(&settings, None, at(1, 20, 0), utc()),
            Some(at(2, 9, 0))
        );
    }

    #[test]
    fn test_custom_without_times() {
        let settings = custom(&[]);
        assert_eq!(next_reminder(&settings, None, at(1, 8, 0), utc()), None);
    }

    #[test]
    fn test_custom_times_read_in_offset() {
        // 09:00 at UTC+2 is 07:00 UTC
        let settings = custom(&["09:00"]);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            next_reminder(&settings, None, at(1, 6, 0), plus_two),
            Some(at(1, 7, 0))
        );
    }

    #[test]
    fn test_disabled_returns_none() {
        let settings = ReminderSettings {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(next_reminder(&settings, None, at(1, 8, 0), utc()), None);
    }

    #[test]
    fn test_quiet_hours_wrapping_midnight() {
        let settings = ReminderSettings {
            quiet_hours: quiet("22:00", "07:00"),
            ..Default::default()
        };

        // 21:30 + 60 min lands at 22:30, pushed to 07:00 next day
        assert_eq!(
            next_reminder(&settings, Some(at(1, 21, 30)), at(1, 21, 45), utc()),
            Some(at(2, 7, 0))
        );
        // 02:00 + 60 min lands at 03:00, pushed to 07:00 same day
        assert_eq!(
            next_reminder(&settings, Some(at(2, 2, 0)), at(2, 2, 0), utc()),
            Some(at(2, 7, 0))
        );
        // Outside the window, unchanged
        assert_eq!(
            next_reminder(&settings, Some(at(2, 8, 0)), at(2, 8, 0), utc()),
            Some(at(2, 9, 0))
        );
    }

    #[test]
    fn test_quiet_hours_same_day_window() {
        let settings = ReminderSettings {
            quiet_hours: quiet("12:00", "13:30"),
            ..custom(&["12:15"])
        };
        assert_eq!(
            next_reminder(&settings, None, at(1, 10, 0), utc()),
            Some(at(1, 13, 30))
        );
    }

    #[test]
    fn test_in_quiet_hours() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert!(in_quiet_hours(t(23, 0), t(22, 0), t(7, 0)));
        assert!(in_quiet_hours(t(6, 59), t(22, 0), t(7, 0)));
        assert!(!in_quiet_hours(t(7, 0), t(22, 0), t(7, 0)));
        assert!(in_quiet_hours(t(12, 0), t(12, 0), t(13, 0)));
        assert!(!in_quiet_hours(t(13, 0), t(12, 0), t(13, 0)));
    }
}
