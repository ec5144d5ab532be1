//! Hydration tracking
//!
//! Pure computations over a user's logs and documents:
//!
//! - **validation**: Input checks with user-facing messages
//! - **progress**: Today's total, percentage and per-type split
//! - **reports**: Day bucketing, streaks, averages and insights
//! - **history**: Recent totals loaded for post-write checks
//! - **achievements**: Milestone catalog and unlocking

pub mod achievements;
pub mod history;
pub mod progress;
pub mod reports;
pub mod validation;

pub use achievements::{Achievement, AchievementStatus, CATALOG};
pub use history::History;
pub use progress::{drink_advice, format_amount, ml_to_oz, DailyProgress};
pub use reports::{
    checked_day_bounds, day_bounds, local_date, local_to_utc, offset_from_minutes, window_bounds,
    Report, ReportRange,
};
pub use validation::{ValidationError, ValidationResult};
