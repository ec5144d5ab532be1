//! Hydrocult Storage Engine
//!
//! A single SQLite database holding, per user:
//! - `drink_logs`: one row per logged drink, indexed on (user, timestamp)
//! - `documents`: flat JSON documents keyed by (user, collection, doc_id)
//! - `achievements`: unlocked milestones
//!
//! The connection sits behind Tokio's async Mutex so the engine can be
//! shared across handlers as `Arc<StorageEngine>`.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{Document, DrinkLog, LogStatus, UnlockedAchievement};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS drink_logs (
        user_id TEXT NOT NULL,
        id TEXT NOT NULL,
        amount INTEGER NOT NULL,
        drink_type TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        status TEXT NOT NULL,
        PRIMARY KEY (user_id, id)
    );

    CREATE INDEX IF NOT EXISTS idx_logs_user_time ON drink_logs(user_id, timestamp);

    CREATE TABLE IF NOT EXISTS documents (
        user_id TEXT NOT NULL,
        collection TEXT NOT NULL,
        doc_id TEXT NOT NULL,
        body TEXT NOT NULL,
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (user_id, collection, doc_id)
    );

    CREATE TABLE IF NOT EXISTS achievements (
        user_id TEXT NOT NULL,
        achievement_id TEXT NOT NULL,
        unlocked_at INTEGER NOT NULL,
        PRIMARY KEY (user_id, achievement_id)
    );
";

const LOG_COLUMNS: &str = "id, amount, drink_type, timestamp, status";

/// Configuration for the storage engine
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all data
    pub data_dir: PathBuf,
    /// How long SQLite waits on a locked database (default: 5000)
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("hydrocult_data"),
            busy_timeout_ms: 5000,
        }
    }
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Get path to the database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("hydrocult.db")
    }
}

/// Result of inserting a drink log
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The log was stored
    Created,
    /// A log with the same id already existed and is returned unchanged
    Existing(DrinkLog),
}

/// Counts of records removed by [`StorageEngine::delete_user`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeletedRecords {
    pub logs: usize,
    pub documents: usize,
    pub achievements: usize,
}

/// Storage statistics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct StorageStats {
    pub users: u64,
    pub logs: u64,
    pub documents: u64,
    pub achievements: u64,
}

impl std::fmt::Display for StorageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users={}, logs={}, documents={}, achievements={}",
            self.users, self.logs, self.documents, self.achievements
        )
    }
}

/// Raw drink log row, decoded outside of rusqlite's row callback
struct LogRow {
    id: String,
    amount: u32,
    drink_type: String,
    timestamp: i64,
    status: String,
}

impl LogRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            amount: row.get(1)?,
            drink_type: row.get(2)?,
            timestamp: row.get(3)?,
            status: row.get(4)?,
        })
    }

    fn into_log(self) -> StorageResult<DrinkLog> {
        let timestamp = DateTime::from_timestamp_millis(self.timestamp).ok_or_else(|| {
            StorageError::Corruption(format!("timestamp out of range: {}", self.timestamp))
        })?;

        Ok(DrinkLog {
            id: self.id,
            amount: self.amount,
            drink_type: self.drink_type.parse().map_err(StorageError::Corruption)?,
            timestamp,
            status: self.status.parse().map_err(StorageError::Corruption)?,
        })
    }
}

/// SQLite-backed store for logs and per-user documents
pub struct StorageEngine {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl StorageEngine {
    /// Open (or create) the database in the configured data directory
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let path = config.db_path();

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let engine = Self::init(conn, Some(path))?;
        tracing::info!(path = ?engine.path, "Storage engine opened");
        Ok(engine)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Location of the database file, `None` when in memory
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    // ==================== Drink Logs ====================

    /// Store a drink log
    ///
    /// Inserting an id that already exists is not an error: the stored log
    /// is returned so clients can safely retry a failed write.
    pub async fn insert_log(&self, user_id: &str, log: &DrinkLog) -> StorageResult<InsertOutcome> {
        let conn = self.conn.lock().await;
        insert_locked(&conn, user_id, log)
    }

    /// Store a drink log and return the counted intake of `[day_start, day_end)`
    /// as it was just before the insert
    ///
    /// Both happen under one connection lock, so concurrent writes of the
    /// same user each see a distinct "before" total.
    pub async fn insert_log_with_day_total(
        &self,
        user_id: &str,
        log: &DrinkLog,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> StorageResult<(InsertOutcome, u32)> {
        let conn = self.conn.lock().await;

        let before: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM drink_logs
             WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp < ?3 AND status = ?4",
            params![
                user_id,
                day_start.timestamp_millis(),
                day_end.timestamp_millis(),
                LogStatus::Synced.as_str(),
            ],
            |row| row.get(0),
        )?;
        let before = u32::try_from(before.max(0)).unwrap_or(u32::MAX);

        let outcome = insert_locked(&conn, user_id, log)?;
        Ok((outcome, before))
    }

    /// Get a single log
    pub async fn get_log(&self, user_id: &str, id: &str) -> StorageResult<Option<DrinkLog>> {
        let conn = self.conn.lock().await;
        find_log(&conn, user_id, id)
    }

    /// Delete a log, returning whether it existed
    pub async fn delete_log(&self, user_id: &str, id: &str) -> StorageResult<bool> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM drink_logs WHERE user_id = ?1 AND id = ?2",
            params![user_id, id],
        )?;
        Ok(removed > 0)
    }

    /// Logs with `start <= timestamp < end`, oldest first
    pub async fn logs_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<DrinkLog>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM drink_logs
             WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp < ?3
             ORDER BY timestamp, id",
            LOG_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![user_id, start.timestamp_millis(), end.timestamp_millis()],
            LogRow::from_row,
        )?;

        let logs: StorageResult<Vec<DrinkLog>> = rows
            .map(|row| row.map_err(StorageError::from).and_then(LogRow::into_log))
            .collect();
        logs
    }

    /// Every log of a user, oldest first
    pub async fn all_logs(&self, user_id: &str) -> StorageResult<Vec<DrinkLog>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM drink_logs WHERE user_id = ?1 ORDER BY timestamp, id",
            LOG_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id], LogRow::from_row)?;

        let logs: StorageResult<Vec<DrinkLog>> = rows
            .map(|row| row.map_err(StorageError::from).and_then(LogRow::into_log))
            .collect();
        logs
    }

    /// Most recent log of a user
    pub async fn latest_log(&self, user_id: &str) -> StorageResult<Option<DrinkLog>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!(
                "SELECT {} FROM drink_logs WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC LIMIT 1",
                LOG_COLUMNS
            ),
            params![user_id],
            LogRow::from_row,
        )
        .optional()?
        .map(LogRow::into_log)
        .transpose()
    }

    /// Number of logs a user has ever stored
    pub async fn log_count(&self, user_id: &str) -> StorageResult<u64> {
        let conn = self.conn.lock().await;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM drink_logs WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    // ==================== Documents ====================

    /// Read a document, `None` if the user never wrote it
    pub async fn get_document<T: Document>(&self, user_id: &str) -> StorageResult<Option<T>> {
        let conn = self.conn.lock().await;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents
                 WHERE user_id = ?1 AND collection = ?2 AND doc_id = ?3",
                params![user_id, T::COLLECTION, T::DOC_ID],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b).map_err(StorageError::from))
            .transpose()
    }

    /// Read a document, falling back to its defaults
    pub async fn load<T: Document>(&self, user_id: &str) -> StorageResult<T> {
        Ok(self.get_document(user_id).await?.unwrap_or_default())
    }

    /// Overwrite a document in place
    pub async fn put_document<T: Document>(&self, user_id: &str, doc: &T) -> StorageResult<()> {
        let body = serde_json::to_string(doc)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO documents (user_id, collection, doc_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, collection, doc_id)
             DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![
                user_id,
                T::COLLECTION,
                T::DOC_ID,
                body,
                Utc::now().timestamp_millis()
            ],
        )?;

        tracing::debug!(user_id = %user_id, collection = T::COLLECTION, "Document written");
        Ok(())
    }

    // ==================== Achievements ====================

    /// Record an achievement, returning false if it was already unlocked
    pub async fn unlock_achievement(
        &self,
        user_id: &str,
        achievement_id: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let conn = self.conn.lock().await;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO achievements (user_id, achievement_id, unlocked_at)
             VALUES (?1, ?2, ?3)",
            params![user_id, achievement_id, at.timestamp_millis()],
        )?;
        Ok(inserted > 0)
    }

    /// Unlocked achievements of a user, oldest first
    pub async fn achievements(&self, user_id: &str) -> StorageResult<Vec<UnlockedAchievement>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT achievement_id, unlocked_at FROM achievements
             WHERE user_id = ?1 ORDER BY unlocked_at, achievement_id",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut unlocked = Vec::new();
        for row in rows {
            let (achievement_id, millis) = row?;
            let unlocked_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                StorageError::Corruption(format!("timestamp out of range: {}", millis))
            })?;
            unlocked.push(UnlockedAchievement {
                achievement_id,
                unlocked_at,
            });
        }
        Ok(unlocked)
    }

    // ==================== Users ====================

    /// Remove every record belonging to a user
    pub async fn delete_user(&self, user_id: &str) -> StorageResult<DeletedRecords> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let deleted = DeletedRecords {
            logs: tx.execute("DELETE FROM drink_logs WHERE user_id = ?1", params![user_id])?,
            documents: tx.execute("DELETE FROM documents WHERE user_id = ?1", params![user_id])?,
            achievements: tx.execute(
                "DELETE FROM achievements WHERE user_id = ?1",
                params![user_id],
            )?,
        };

        tx.commit()?;

        tracing::info!(
            user_id = %user_id,
            logs = deleted.logs,
            documents = deleted.documents,
            achievements = deleted.achievements,
            "Deleted user data"
        );
        Ok(deleted)
    }

    /// Users with at least one log or document
    pub async fn known_users(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT user_id FROM drink_logs
             UNION
             SELECT user_id FROM documents
             ORDER BY user_id",
        )?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let users: Result<Vec<String>, rusqlite::Error> = rows.collect();
        Ok(users?)
    }

    /// Whether any log, document or achievement of the user remains
    pub async fn has_user(&self, user_id: &str) -> StorageResult<bool> {
        let conn = self.conn.lock().await;
        let exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM drink_logs WHERE user_id = ?1)
                 OR EXISTS (SELECT 1 FROM documents WHERE user_id = ?1)
                 OR EXISTS (SELECT 1 FROM achievements WHERE user_id = ?1)",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Check the database answers queries
    pub async fn ping(&self) -> bool {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    /// Get storage statistics
    pub async fn stats(&self) -> StorageResult<StorageStats> {
        let conn = self.conn.lock().await;
        let count = |sql: &str| -> StorageResult<u64> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n.max(0) as u64)
        };

        Ok(StorageStats {
            users: count(
                "SELECT COUNT(*) FROM (SELECT user_id FROM drink_logs
                 UNION SELECT user_id FROM documents)",
            )?,
            logs: count("SELECT COUNT(*) FROM drink_logs")?,
            documents: count("SELECT COUNT(*) FROM documents")?,
            achievements: count("SELECT COUNT(*) FROM achievements")?,
        })
    }
}

fn insert_locked(conn: &Connection, user_id: &str, log: &DrinkLog) -> StorageResult<InsertOutcome> {
    if let Some(existing) = find_log(conn, user_id, &log.id)? {
        return Ok(InsertOutcome::Existing(existing));
    }

    conn.execute(
        "INSERT INTO drink_logs (user_id, id, amount, drink_type, timestamp, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            log.id,
            log.amount,
            log.drink_type.as_str(),
            log.timestamp.timestamp_millis(),
            log.status.as_str(),
        ],
    )?;

    tracing::debug!(user_id = %user_id, log_id = %log.id, amount = log.amount, "Inserted drink log");
    Ok(InsertOutcome::Created)
}

fn find_log(conn: &Connection, user_id: &str, id: &str) -> StorageResult<Option<DrinkLog>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM drink_logs WHERE user_id = ?1 AND id = ?2",
            LOG_COLUMNS
        ),
        params![user_id, id],
        LogRow::from_row,
    )
    .optional()?
    .map(LogRow::into_log)
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{DailyGoal, DrinkType, NotificationSettings, UserSettings, Units};
    use chrono::{Duration as ChronoDuration, TimeZone};
    use tempfile::tempdir;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::new(dir.path().join("data"));
        let engine = StorageEngine::open(&config).unwrap();

        assert!(config.db_path().exists());
        assert_eq!(engine.path(), Some(&config.db_path()));
        assert!(engine.ping().await);
    }

    #[tokio::test]
    async fn test_insert_and_range_query() {
        let engine = StorageEngine::open_in_memory().unwrap();

        for hour in [8, 12, 18] {
            let log = DrinkLog::new(250, DrinkType::Water).at(ts(hour));
            assert_eq!(
                engine.insert_log("alice", &log).await.unwrap(),
                InsertOutcome::Created
            );
        }
        engine
            .insert_log("bob", &DrinkLog::new(500, DrinkType::Tea).at(ts(9)))
            .await
            .unwrap();

        let logs = engine.logs_in_range("alice", ts(8), ts(18)).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].timestamp, ts(8));
        assert_eq!(logs[1].timestamp, ts(12));

        let all = engine.all_logs("alice").await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(engine.log_count("alice").await.unwrap(), 3);
        assert_eq!(engine.log_count("bob").await.unwrap(), 1);

        let latest = engine.latest_log("alice").await.unwrap().unwrap();
        assert_eq!(latest.timestamp, ts(18));
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_on_id() {
        let engine = StorageEngine::open_in_memory().unwrap();
        let log = DrinkLog::new(250, DrinkType::Coffee)
            .with_id("client-1")
            .at(ts(10));

        engine.insert_log("alice", &log).await.unwrap();

        let retry = DrinkLog::new(999, DrinkType::Water).with_id("client-1");
        match engine.insert_log("alice", &retry).await.unwrap() {
            InsertOutcome::Existing(existing) => {
                assert_eq!(existing.amount, 250);
                assert_eq!(existing.drink_type, DrinkType::Coffee);
            }
            InsertOutcome::Created => panic!("Expected existing log"),
        }
        assert_eq!(engine.all_logs("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_reports_day_total_before_write() {
        let engine = StorageEngine::open_in_memory().unwrap();
        let (start, end) = (ts(0), ts(0) + ChronoDuration::days(1));

        // Outside the window and uncounted entries are excluded
        engine
            .insert_log("alice", &DrinkLog::new(900, DrinkType::Water).at(ts(0) - ChronoDuration::hours(1)))
            .await
            .unwrap();
        engine
            .insert_log(
                "alice",
                &DrinkLog::new(400, DrinkType::Water)
                    .at(ts(7))
                    .with_status(LogStatus::Pending),
            )
            .await
            .unwrap();

        let first = DrinkLog::new(600, DrinkType::Water).at(ts(9));
        let (outcome, before) = engine
            .insert_log_with_day_total("alice", &first, start, end)
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Created);
        assert_eq!(before, 0);

        let second = DrinkLog::new(600, DrinkType::Tea).at(ts(10));
        let (_, before) = engine
            .insert_log_with_day_total("alice", &second, start, end)
            .await
            .unwrap();
        assert_eq!(before, 600);

        // Replaying an id reports the existing row and the current total
        let (outcome, before) = engine
            .insert_log_with_day_total("alice", &first, start, end)
            .await
            .unwrap();
        assert!(matches!(outcome, InsertOutcome::Existing(_)));
        assert_eq!(before, 1200);
        assert_eq!(engine.log_count("alice").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_see_distinct_totals() {
        let engine = std::sync::Arc::new(StorageEngine::open_in_memory().unwrap());
        let (start, end) = (ts(0), ts(0) + ChronoDuration::days(1));

        let a = {
            let engine = engine.clone();
            tokio::spawn(async move {
                let log = DrinkLog::new(600, DrinkType::Water).at(ts(9));
                engine.insert_log_with_day_total("alice", &log, start, end).await
            })
        };
        let b = {
            let engine = engine.clone();
            tokio::spawn(async move {
                let log = DrinkLog::new(600, DrinkType::Water).at(ts(9));
                engine.insert_log_with_day_total("alice", &log, start, end).await
            })
        };

        let (_, first) = a.await.unwrap().unwrap();
        let (_, second) = b.await.unwrap().unwrap();
        let mut totals = [first, second];
        totals.sort();
        assert_eq!(totals, [0, 600]);
    }

    #[tokio::test]
    async fn test_delete_log() {
        let engine = StorageEngine::open_in_memory().unwrap();
        let log = DrinkLog::new(250, DrinkType::Water);
        engine.insert_log("alice", &log).await.unwrap();

        // Another user cannot delete it
        assert!(!engine.delete_log("bob", &log.id).await.unwrap());
        assert!(engine.delete_log("alice", &log.id).await.unwrap());
        assert!(!engine.delete_log("alice", &log.id).await.unwrap());
        assert!(engine.get_log("alice", &log.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_documents_default_and_overwrite() {
        let engine = StorageEngine::open_in_memory().unwrap();

        assert!(engine
            .get_document::<DailyGoal>("alice")
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            engine.load::<DailyGoal>("alice").await.unwrap(),
            DailyGoal::default()
        );

        engine
            .put_document("alice", &DailyGoal { amount: 3000 })
            .await
            .unwrap();
        engine
            .put_document("alice", &DailyGoal { amount: 3500 })
            .await
            .unwrap();

        assert_eq!(
            engine.load::<DailyGoal>("alice").await.unwrap().amount,
            3500
        );

        // Documents are independent of each other
        let settings = UserSettings {
            units: Units::Oz,
            ..Default::default()
        };
        engine.put_document("alice", &settings).await.unwrap();
        assert_eq!(
            engine.load::<UserSettings>("alice").await.unwrap().units,
            Units::Oz
        );
        assert_eq!(
            engine.load::<NotificationSettings>("alice").await.unwrap(),
            NotificationSettings::default()
        );
    }

    #[tokio::test]
    async fn test_unlock_achievement_once() {
        let engine = StorageEngine::open_in_memory().unwrap();

        assert!(engine
            .unlock_achievement("alice", "first-log", ts(8))
            .await
            .unwrap());
        assert!(!engine
            .unlock_achievement("alice", "first-log", ts(9))
            .await
            .unwrap());

        let unlocked = engine.achievements("alice").await.unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].unlocked_at, ts(8));
    }

    #[tokio::test]
    async fn test_delete_user_removes_everything() {
        let engine = StorageEngine::open_in_memory().unwrap();
        engine
            .insert_log("alice", &DrinkLog::new(250, DrinkType::Water))
            .await
            .unwrap();
        engine
            .put_document("alice", &DailyGoal { amount: 2000 })
            .await
            .unwrap();
        engine
            .unlock_achievement("alice", "first-log", Utc::now())
            .await
            .unwrap();
        engine
            .insert_log("bob", &DrinkLog::new(250, DrinkType::Water))
            .await
            .unwrap();

        let deleted = engine.delete_user("alice").await.unwrap();
        assert_eq!(
            deleted,
            DeletedRecords {
                logs: 1,
                documents: 1,
                achievements: 1
            }
        );

        assert!(engine.all_logs("alice").await.unwrap().is_empty());
        assert!(engine.achievements("alice").await.unwrap().is_empty());
        assert_eq!(engine.known_users().await.unwrap(), vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn test_has_user() {
        let engine = StorageEngine::open_in_memory().unwrap();
        assert!(!engine.has_user("alice").await.unwrap());

        engine
            .unlock_achievement("alice", "first-log", Utc::now())
            .await
            .unwrap();
        assert!(engine.has_user("alice").await.unwrap());

        engine
            .put_document("bob", &DailyGoal { amount: 1500 })
            .await
            .unwrap();
        assert!(engine.has_user("bob").await.unwrap());

        engine.delete_user("alice").await.unwrap();
        assert!(!engine.has_user("alice").await.unwrap());
        assert!(engine.has_user("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_known_users_and_stats() {
        let engine = StorageEngine::open_in_memory().unwrap();
        engine
            .insert_log("carol", &DrinkLog::new(250, DrinkType::Water))
            .await
            .unwrap();
        engine
            .put_document("dave", &UserSettings::default())
            .await
            .unwrap();
        engine
            .insert_log(
                "carol",
                &DrinkLog::new(300, DrinkType::Juice).at(Utc::now() - ChronoDuration::hours(1)),
            )
            .await
            .unwrap();

        assert_eq!(
            engine.known_users().await.unwrap(),
            vec!["carol".to_string(), "dave".to_string()]
        );

        let stats = engine.stats().await.unwrap();
        assert_eq!(stats.users, 2);
        assert_eq!(stats.logs, 2);
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.achievements, 0);
    }
}
