//! Progress Routes
//!
//! - GET /api/v1/progress - Intake against the goal for one day

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{DayQuery, ProgressResponse};
use crate::api::error::ApiResult;
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::storage::{DailyGoal, UserSettings};
use crate::tracker::{local_date, DailyProgress};

/// GET /api/v1/progress?date=YYYY-MM-DD
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<DayQuery>,
) -> ApiResult<Json<ProgressResponse>> {
    let offset = state.offset(query.tz_offset_minutes)?;
    let date = query
        .date
        .unwrap_or_else(|| local_date(Utc::now(), offset));

    let (start, end) = state.day_window(date, offset)?;
    let logs = state.storage.logs_in_range(&user_id, start, end).await?;
    let goal: DailyGoal = state.storage.load(&user_id).await?;
    let settings: UserSettings = state.storage.load(&user_id).await?;

    let progress = DailyProgress::compute(date, &logs, goal.amount);
    let summary = progress.summary(settings.units);

    Ok(Json(ProgressResponse {
        progress,
        units: settings.units,
        summary,
    }))
}
