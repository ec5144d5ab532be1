//! Daily progress
//!
//! Derived state shown on the dashboard: how much was drunk today, how far
//! along the goal that is, and how it splits across drink types.

use crate::storage::{DrinkLog, DrinkType, Units};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Milliliters in one US fluid ounce
pub const ML_PER_OZ: f64 = 29.5735;

/// Progress towards the goal for a single day
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub total_ml: u32,
    pub goal_ml: u32,
    /// Rounded percentage of the goal, may exceed 100
    pub percent: u32,
    /// Same value capped at 100, for the radial visual
    pub visual_percent: u32,
    pub remaining_ml: u32,
    pub goal_met: bool,
    pub log_count: usize,
    pub by_type: BTreeMap<DrinkType, u32>,
}

impl DailyProgress {
    /// Compute progress from a day's logs
    pub fn compute(date: NaiveDate, logs: &[DrinkLog], goal_ml: u32) -> Self {
        let mut by_type = BTreeMap::new();
        let mut total_ml = 0u32;
        let mut log_count = 0;

        for log in logs.iter().filter(|l| l.is_counted()) {
            total_ml = total_ml.saturating_add(log.amount);
            *by_type.entry(log.drink_type).or_insert(0u32) += log.amount;
            log_count += 1;
        }

        let percent = percent_of_goal(total_ml, goal_ml);

        Self {
            date,
            total_ml,
            goal_ml,
            percent,
            visual_percent: percent.min(100),
            remaining_ml: goal_ml.saturating_sub(total_ml),
            goal_met: goal_met(total_ml, goal_ml),
            log_count,
            by_type,
        }
    }

    /// One-line summary suitable for sharing
    pub fn summary(&self, units: Units) -> String {
        format!(
            "I've had {} of my {} goal today ({}%)",
            format_amount(self.total_ml, units),
            format_amount(self.goal_ml, units),
            self.percent
        )
    }
}

/// Sum of counted logs
pub fn total_intake(logs: &[DrinkLog]) -> u32 {
    logs.iter()
        .filter(|l| l.is_counted())
        .fold(0u32, |acc, l| acc.saturating_add(l.amount))
}

/// `round(total / goal * 100)`, 0 when there is no goal
pub fn percent_of_goal(total_ml: u32, goal_ml: u32) -> u32 {
    if goal_ml == 0 {
        return 0;
    }
    ((total_ml as f64 / goal_ml as f64) * 100.0).round() as u32
}

pub fn goal_met(total_ml: u32, goal_ml: u32) -> bool {
    goal_ml > 0 && total_ml >= goal_ml
}

/// True when a write moved the total from below the goal to at or above it
pub fn goal_crossed(before_ml: u32, after_ml: u32, goal_ml: u32) -> bool {
    !goal_met(before_ml, goal_ml) && goal_met(after_ml, goal_ml)
}

/// Convert ml to oz, rounded to one decimal
pub fn ml_to_oz(ml: u32) -> f64 {
    ((ml as f64 / ML_PER_OZ) * 10.0).round() / 10.0
}

/// Render an amount in the user's units
pub fn format_amount(ml: u32, units: Units) -> String {
    match units {
        Units::Ml => format!("{} ml", ml),
        Units::Oz => format!("{:.1} oz", ml_to_oz(ml)),
    }
}

/// Moderation note shown when logging anything but water
pub fn drink_advice(drink_type: DrinkType) -> Option<&'static str> {
    match drink_type {
        DrinkType::Water => None,
        DrinkType::Coffee => {
            Some("Coffee can be dehydrating in large amounts. Moderation is key!")
        }
        DrinkType::Tea => Some("Some teas are diuretic. Remember to balance with plain water."),
        DrinkType::Juice => {
            Some("Juices can be high in sugar. Water is the best for pure hydration.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LogStatus;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_only_synced_logs_count() {
        let logs = vec![
            DrinkLog::new(500, DrinkType::Water),
            DrinkLog::new(300, DrinkType::Coffee).with_status(LogStatus::Pending),
            DrinkLog::new(200, DrinkType::Tea).with_status(LogStatus::Error),
            DrinkLog::new(250, DrinkType::Tea),
        ];

        let progress = DailyProgress::compute(day(), &logs, 2000);
        assert_eq!(progress.total_ml, 750);
        assert_eq!(progress.log_count, 2);
        assert_eq!(progress.by_type.get(&DrinkType::Water), Some(&500));
        assert_eq!(progress.by_type.get(&DrinkType::Tea), Some(&250));
        assert!(!progress.by_type.contains_key(&DrinkType::Coffee));
        assert_eq!(total_intake(&logs), 750);
    }

    #[test]
    fn test_visual_percent_capped() {
        let logs = vec![DrinkLog::new(3000, DrinkType::Water)];
        let progress = DailyProgress::compute(day(), &logs, 2000);

        assert_eq!(progress.percent, 150);
        assert_eq!(progress.visual_percent, 100);
        assert_eq!(progress.remaining_ml, 0);
        assert!(progress.goal_met);
    }

    #[test]
    fn test_percent_rounding_and_zero_goal() {
        assert_eq!(percent_of_goal(1000, 3000), 33);
        assert_eq!(percent_of_goal(2000, 3000), 67);
        assert_eq!(percent_of_goal(500, 0), 0);

        let progress = DailyProgress::compute(day(), &[], 0);
        assert_eq!(progress.percent, 0);
        assert!(!progress.goal_met);
    }

    #[test]
    fn test_goal_crossed() {
        assert!(goal_crossed(2000, 2500, 2500));
        assert!(goal_crossed(0, 3000, 2500));
        assert!(!goal_crossed(2500, 2750, 2500));
        assert!(!goal_crossed(1000, 2000, 2500));
    }

    #[test]
    fn test_units() {
        assert_eq!(ml_to_oz(250), 8.5);
        assert_eq!(ml_to_oz(0), 0.0);
        assert_eq!(format_amount(2500, Units::Ml), "2500 ml");
        assert_eq!(format_amount(2500, Units::Oz), "84.5 oz");
    }

    #[test]
    fn test_summary() {
        let logs = vec![DrinkLog::new(1250, DrinkType::Water)];
        let progress = DailyProgress::compute(day(), &logs, 2500);
        assert_eq!(
            progress.summary(Units::Ml),
            "I've had 1250 ml of my 2500 ml goal today (50%)"
        );
    }

    #[test]
    fn test_drink_advice() {
        assert!(drink_advice(DrinkType::Water).is_none());
        assert!(drink_advice(DrinkType::Coffee).unwrap().contains("Moderation"));
        assert!(drink_advice(DrinkType::Juice).unwrap().contains("sugar"));
        assert!(drink_advice(DrinkType::Tea).is_some());
    }
}
