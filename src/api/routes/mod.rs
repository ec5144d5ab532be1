//! API Routes
//!
//! Route handlers organized by functionality.

pub mod account;
pub mod achievements;
pub mod export;
pub mod goal;
pub mod health;
pub mod logs;
pub mod progress;
pub mod reminders;
pub mod reports;
pub mod settings;
