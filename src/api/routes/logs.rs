//! Log Routes
//!
//! - GET /api/v1/logs - Logs of one day
//! - POST /api/v1/logs - Log a drink
//! - DELETE /api/v1/logs/:id - Delete a log

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;

use crate::api::dto::{CreateLogRequest, DayQuery, LogListResponse, LogResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::reminders::log_write_alerts;
use crate::storage::{DrinkLog, InsertOutcome, NotificationSettings, StorageResult};
use crate::tracker::achievements::unlock_earned;
use crate::tracker::progress::total_intake;
use crate::tracker::validation::validate_amount;
use crate::tracker::{day_bounds, local_date, History};
use crate::websocket::WsEvent;

/// GET /api/v1/logs?date=YYYY-MM-DD
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<DayQuery>,
) -> ApiResult<Json<LogListResponse>> {
    let offset = state.offset(query.tz_offset_minutes)?;
    let date = query
        .date
        .unwrap_or_else(|| local_date(Utc::now(), offset));

    let (start, end) = state.day_window(date, offset)?;
    let logs = state.storage.logs_in_range(&user_id, start, end).await?;

    Ok(Json(LogListResponse {
        date,
        total_ml: total_intake(&logs),
        count: logs.len(),
        logs,
    }))
}

/// POST /api/v1/logs
///
/// Returns 201 for a new log. Replaying a known id returns 200 with the
/// stored log and triggers nothing.
pub async fn create_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateLogRequest>,
) -> ApiResult<(StatusCode, Json<LogResponse>)> {
    let amount = validate_amount(req.amount)?;
    let offset = state.offset(req.tz_offset_minutes)?;

    let mut log = DrinkLog::new(amount, req.drink_type.unwrap_or_default());
    if let Some(timestamp) = req.timestamp {
        log = log.at(timestamp);
    }
    if let Some(id) = req.id {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::Validation("id: Log id cannot be empty".to_string()));
        }
        log = log.with_id(id);
    }

    let now = Utc::now();
    let (day_start, day_end) = day_bounds(local_date(now, offset), offset);
    let (outcome, before_ml) = state
        .storage
        .insert_log_with_day_total(&user_id, &log, day_start, day_end)
        .await?;

    match outcome {
        InsertOutcome::Existing(existing) => {
            tracing::debug!(user_id = %user_id, log_id = %existing.id, "Duplicate log ignored");
            Ok((StatusCode::OK, Json(existing.into())))
        }
        InsertOutcome::Created => {
            tracing::info!(
                user_id = %user_id,
                log_id = %log.id,
                amount = log.amount,
                drink_type = %log.drink_type,
                "Drink logged"
            );

            state
                .ws_hub
                .publish(WsEvent::log_created(&user_id, log.clone()));
            state.reschedule(&user_id).await;

            let written = LogWrite {
                log: &log,
                before_ml,
                at: now,
            };
            if let Err(e) = after_log_created(&state, &user_id, written, offset).await {
                tracing::warn!(user_id = %user_id, error = %e, "Post-log checks failed");
            }

            Ok((StatusCode::CREATED, Json(log.into())))
        }
    }
}

/// DELETE /api/v1/logs/:id
pub async fn delete_log(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.storage.delete_log(&user_id, &id).await? {
        return Err(ApiError::NotFound(format!("Log '{}' not found", id)));
    }

    tracing::info!(user_id = %user_id, log_id = %id, "Log deleted");
    state.ws_hub.publish(WsEvent::log_deleted(&user_id, &id));
    state.reschedule(&user_id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// A freshly inserted log and today's counted total just before it
struct LogWrite<'a> {
    log: &'a DrinkLog,
    before_ml: u32,
    at: DateTime<Utc>,
}

/// Unlock achievements and raise goal or streak alerts for a new log
async fn after_log_created(
    state: &AppState,
    user_id: &str,
    written: LogWrite<'_>,
    offset: FixedOffset,
) -> StorageResult<()> {
    let now = written.at;
    let history = History::load(&state.storage, user_id, now, offset).await?;

    for achievement in unlock_earned(&state.storage, user_id, &history, now).await? {
        state
            .ws_hub
            .publish(WsEvent::achievement_unlocked(user_id, achievement, now));
    }

    let log = written.log;
    let added_today = if log.is_counted() && local_date(log.timestamp, offset) == history.today {
        log.amount
    } else {
        0
    };

    let prefs: NotificationSettings = state.storage.load(user_id).await?;
    for alert in log_write_alerts(&prefs, &history, written.before_ml, added_today) {
        state.notifier.notify(user_id, alert).await;
    }

    Ok(())
}
