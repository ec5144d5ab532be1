//! Achievements
//!
//! A fixed catalog of milestones. Each is unlocked at most once per user.

use crate::storage::{StorageEngine, StorageResult, UnlockedAchievement};
use crate::tracker::history::History;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const FIRST_LOG: Achievement = Achievement {
    id: "first-log",
    title: "First Drop",
    description: "Log your first drink.",
};

pub const THREE_DAY_STREAK: Achievement = Achievement {
    id: "3-day-streak",
    title: "Streak Starter",
    description: "Maintain a 3-day streak.",
};

pub const SEVEN_DAY_STREAK: Achievement = Achievement {
    id: "7-day-streak",
    title: "Hydration Hero",
    description: "Maintain a 7-day streak.",
};

pub const PERFECT_WEEK: Achievement = Achievement {
    id: "perfect-week",
    title: "Perfect Week",
    description: "Meet your goal every day for a week.",
};

pub const CATALOG: [Achievement; 4] = [FIRST_LOG, THREE_DAY_STREAK, SEVEN_DAY_STREAK, PERFECT_WEEK];

/// Catalog entry joined with the user's unlock state
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

/// Every catalog entry with its unlock state
pub fn catalog_status(unlocked: &[UnlockedAchievement]) -> Vec<AchievementStatus> {
    CATALOG
        .iter()
        .map(|achievement| {
            let unlocked_at = unlocked
                .iter()
                .find(|u| u.achievement_id == achievement.id)
                .map(|u| u.unlocked_at);
            AchievementStatus {
                achievement: *achievement,
                unlocked: unlocked_at.is_some(),
                unlocked_at,
            }
        })
        .collect()
}

/// Achievements the history qualifies for, unlocked or not
pub fn earned(history: &History) -> Vec<Achievement> {
    let streak = history.current_streak();

    CATALOG
        .iter()
        .filter(|a| match a.id {
            "first-log" => history.log_count > 0,
            "3-day-streak" => streak >= 3,
            "7-day-streak" => streak >= 7,
            "perfect-week" => history.perfect_week(),
            _ => false,
        })
        .copied()
        .collect()
}

/// Persist every earned achievement, returning only the newly unlocked ones
pub async fn unlock_earned(
    storage: &StorageEngine,
    user_id: &str,
    history: &History,
    now: DateTime<Utc>,
) -> StorageResult<Vec<Achievement>> {
    let mut unlocked = Vec::new();

    for achievement in earned(history) {
        if storage.unlock_achievement(user_id, achievement.id, now).await? {
            tracing::info!(user_id = %user_id, achievement = achievement.id, "Achievement unlocked");
            unlocked.push(achievement);
        }
    }

    Ok(unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::collections::BTreeMap;

    fn history(met_days: i64, log_count: u64) -> History {
        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let totals: BTreeMap<NaiveDate, u32> = (0..met_days)
            .map(|back| (today - Duration::days(back), 2500))
            .collect();
        History {
            today,
            goal: 2500,
            totals,
            log_count,
        }
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = CATALOG.iter().map(|a| a.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
        assert_eq!(find("perfect-week"), Some(&PERFECT_WEEK));
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_earned() {
        assert!(earned(&history(0, 0)).is_empty());
        assert_eq!(earned(&history(1, 1)), vec![FIRST_LOG]);
        assert_eq!(earned(&history(3, 3)), vec![FIRST_LOG, THREE_DAY_STREAK]);
        assert_eq!(earned(&history(7, 7)), CATALOG.to_vec());
    }

    #[test]
    fn test_catalog_status() {
        let at = Utc::now();
        let unlocked = vec![UnlockedAchievement {
            achievement_id: "first-log".to_string(),
            unlocked_at: at,
        }];

        let status = catalog_status(&unlocked);
        assert_eq!(status.len(), 4);
        assert!(status[0].unlocked);
        assert_eq!(status[0].unlocked_at, Some(at));
        assert!(status[1..].iter().all(|s| !s.unlocked));

        let json = serde_json::to_value(&status[0]).unwrap();
        assert_eq!(json["id"], "first-log");
        assert_eq!(json["title"], "First Drop");
    }

    #[tokio::test]
    async fn test_unlock_only_once() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let h = history(3, 3);

        let first = unlock_earned(&storage, "alice", &h, Utc::now()).await.unwrap();
        assert_eq!(first, vec![FIRST_LOG, THREE_DAY_STREAK]);

        let second = unlock_earned(&storage, "alice", &h, Utc::now()).await.unwrap();
        assert!(second.is_empty());

        assert_eq!(storage.achievements("alice").await.unwrap().len(), 2);
    }
}
