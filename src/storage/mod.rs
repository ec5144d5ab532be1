//! Hydrocult Storage
//!
//! This module persists everything a user owns:
//!
//! - **types**: Records and documents (DrinkLog, DailyGoal, ReminderSettings, ...)
//! - **engine**: SQLite-backed store for logs, documents and achievements
//! - **error**: Error types
//!
//! # Layout
//!
//! ```text
//! drink_logs    (user_id, id)                    -> one row per drink
//! documents     (user_id, collection, doc_id)    -> JSON body
//! achievements  (user_id, achievement_id)        -> unlock time
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use hydrocult::storage::{DailyGoal, DrinkLog, DrinkType, StorageConfig, StorageEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = StorageEngine::open(&StorageConfig::new("./data"))?;
//!
//!     engine.insert_log("alice", &DrinkLog::new(250, DrinkType::Water)).await?;
//!     engine.put_document("alice", &DailyGoal { amount: 3000 }).await?;
//!
//!     let goal: DailyGoal = engine.load("alice").await?;
//!     println!("Goal: {} ml", goal.amount);
//!
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use engine::{DeletedRecords, InsertOutcome, StorageConfig, StorageEngine, StorageStats};
pub use error::{StorageError, StorageResult};
pub use types::*;
