//! Input validation
//!
//! Every check returns a [`ValidationError`] whose message can be shown to
//! the user as-is.

use crate::storage::{QuietHours, ReminderSettings};
use chrono::NaiveTime;
use thiserror::Error;

/// Largest single drink accepted, in ml
pub const MAX_DRINK_ML: u32 = 5000;

/// Largest daily goal accepted, in ml
pub const MAX_GOAL_ML: u32 = 20_000;

/// Bounds for interval reminders, in minutes
pub const MIN_INTERVAL_MINUTES: u32 = 5;
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

/// Literal the user must type to delete their account
pub const DELETE_CONFIRMATION: &str = "DELETE";

/// A rejected input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check a drink amount
pub fn validate_amount(amount: u32) -> ValidationResult<u32> {
    if amount == 0 {
        return Err(ValidationError::new("amount", "Amount must be greater than 0"));
    }
    if amount > MAX_DRINK_ML {
        return Err(ValidationError::new(
            "amount",
            format!("Amount must be at most {} ml", MAX_DRINK_ML),
        ));
    }
    Ok(amount)
}

/// Check a daily goal
pub fn validate_goal(amount: u32) -> ValidationResult<u32> {
    if amount == 0 {
        return Err(ValidationError::new("goal", "Goal must be greater than 0"));
    }
    if amount > MAX_GOAL_ML {
        return Err(ValidationError::new(
            "goal",
            format!("Goal must be at most {} ml", MAX_GOAL_ML),
        ));
    }
    Ok(amount)
}

/// Parse a strict `HH:MM` time of day (two digits each, 00-23 and 00-59)
pub fn parse_time_of_day(value: &str) -> ValidationResult<NaiveTime> {
    let re = regex::Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$")
        .map_err(|e| ValidationError::new("time", e.to_string()))?;

    let caps = re.captures(value).ok_or_else(|| {
        ValidationError::new(
            "time",
            format!("Invalid time '{}'. Use HH:MM format", value),
        )
    })?;

    let hour: u32 = caps[1]
        .parse()
        .map_err(|_| ValidationError::new("time", "Invalid hour"))?;
    let minute: u32 = caps[2]
        .parse()
        .map_err(|_| ValidationError::new("time", "Invalid minute"))?;

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| ValidationError::new("time", format!("Invalid time '{}'", value)))
}

/// Check a time about to be added to the custom reminder list
pub fn validate_new_time(value: &str, existing: &[String]) -> ValidationResult<String> {
    parse_time_of_day(value)?;
    if existing.iter().any(|t| t == value) {
        return Err(ValidationError::new(
            "time",
            format!("Reminder time {} already exists", value),
        ));
    }
    Ok(value.to_string())
}

/// Insert a time keeping the list sorted; `HH:MM` sorts lexically
pub fn insert_time_sorted(times: &mut Vec<String>, value: String) {
    let pos = times.partition_point(|t| t.as_str() < value.as_str());
    times.insert(pos, value);
}

/// Check an interval reminder period
pub fn validate_interval(minutes: u32) -> ValidationResult<u32> {
    if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        return Err(ValidationError::new(
            "interval_minutes",
            format!(
                "Interval must be between {} and {} minutes",
                MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES
            ),
        ));
    }
    Ok(minutes)
}

/// Check a quiet-hours window
pub fn validate_quiet_hours(quiet: &QuietHours) -> ValidationResult<()> {
    parse_time_of_day(&quiet.start)
        .map_err(|e| ValidationError::new("quiet_hours.start", e.message))?;
    parse_time_of_day(&quiet.end)
        .map_err(|e| ValidationError::new("quiet_hours.end", e.message))?;

    if quiet.start == quiet.end {
        return Err(ValidationError::new(
            "quiet_hours",
            "Quiet hours start and end must differ",
        ));
    }
    Ok(())
}

/// Check a whole reminder document before it is stored
pub fn validate_reminder_settings(settings: &ReminderSettings) -> ValidationResult<()> {
    validate_interval(settings.interval_minutes)?;

    for (i, time) in settings.custom_times.iter().enumerate() {
        validate_new_time(time, &settings.custom_times[..i])?;
    }

    if let Some(quiet) = &settings.quiet_hours {
        validate_quiet_hours(quiet)?;
    }
    Ok(())
}

/// Check the account deletion confirmation
pub fn validate_delete_confirmation(confirm: &str) -> ValidationResult<()> {
    if confirm != DELETE_CONFIRMATION {
        return Err(ValidationError::new(
            "confirm",
            format!("Type {} to confirm account deletion", DELETE_CONFIRMATION),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_bounds() {
        assert!(validate_amount(0).is_err());
        assert_eq!(validate_amount(1), Ok(1));
        assert_eq!(validate_amount(5000), Ok(5000));
        assert!(validate_amount(5001).is_err());
    }

    #[test]
    fn test_goal_bounds() {
        let err = validate_goal(0).unwrap_err();
        assert_eq!(err.field, "goal");
        assert_eq!(validate_goal(2500), Ok(2500));
        assert!(validate_goal(20_001).is_err());
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_time_of_day("23:59").is_ok());
        assert!(parse_time_of_day("00:00").is_ok());

        for bad in ["24:00", "9:30", "12:60", "12:5", "noon", "", "12:30:00"] {
            assert!(parse_time_of_day(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_new_time_must_be_unique() {
        let existing = vec!["09:00".to_string(), "14:00".to_string()];
        assert!(validate_new_time("09:00", &existing).is_err());
        assert_eq!(validate_new_time("10:15", &existing).unwrap(), "10:15");
        assert!(validate_new_time("25:00", &existing).is_err());
    }

    #[test]
    fn test_insert_time_sorted() {
        let mut times = vec!["09:00".to_string(), "14:00".to_string()];
        insert_time_sorted(&mut times, "11:30".to_string());
        insert_time_sorted(&mut times, "07:45".to_string());
        insert_time_sorted(&mut times, "22:00".to_string());
        assert_eq!(times, vec!["07:45", "09:00", "11:30", "14:00", "22:00"]);
    }

    #[test]
    fn test_interval_bounds() {
        assert!(validate_interval(4).is_err());
        assert!(validate_interval(5).is_ok());
        assert!(validate_interval(1440).is_ok());
        assert!(validate_interval(1441).is_err());
    }

    #[test]
    fn test_quiet_hours() {
        let ok = QuietHours {
            start: "22:00".to_string(),
            end: "07:00".to_string(),
        };
        assert!(validate_quiet_hours(&ok).is_ok());

        let same = QuietHours {
            start: "22:00".to_string(),
            end: "22:00".to_string(),
        };
        assert!(validate_quiet_hours(&same).is_err());

        let bad = QuietHours {
            start: "22:00".to_string(),
            end: "7am".to_string(),
        };
        assert_eq!(validate_quiet_hours(&bad).unwrap_err().field, "quiet_hours.end");
    }

    #[test]
    fn test_reminder_settings_rejects_duplicates() {
        let mut settings = ReminderSettings::default();
        assert!(validate_reminder_settings(&settings).is_ok());

        settings.custom_times.push("09:00".to_string());
        assert!(validate_reminder_settings(&settings).is_err());
    }

    #[test]
    fn test_delete_confirmation() {
        assert!(validate_delete_confirmation("DELETE").is_ok());
        assert!(validate_delete_confirmation("delete").is_err());
        assert!(validate_delete_confirmation("").is_err());
    }
}
