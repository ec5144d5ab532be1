//! Report Routes
//!
//! - GET /api/v1/reports?range=7d|30d - Daily series, averages and streaks

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::ReportQuery;
use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::storage::DailyGoal;
use crate::tracker::{local_date, window_bounds, Report, ReportRange};

/// GET /api/v1/reports
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Report>> {
    let range = match query.range.as_deref() {
        Some(range) => range.parse::<ReportRange>().map_err(ApiError::Validation)?,
        None => ReportRange::default(),
    };
    let offset = state.offset(query.tz_offset_minutes)?;

    let today = local_date(Utc::now(), offset);
    let (start, end) = window_bounds(today, range.days(), offset);
    let logs = state.storage.logs_in_range(&user_id, start, end).await?;
    let goal: DailyGoal = state.storage.load(&user_id).await?;

    let report = Report::build(&logs, goal.amount, today, offset, range);
    tracing::debug!(
        user_id = %user_id,
        range = range.as_str(),
        logs = logs.len(),
        "Report built"
    );

    Ok(Json(report))
}
