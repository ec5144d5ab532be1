//! Reminder Routes
//!
//! - GET /api/v1/reminders - Reminder schedule
//! - PUT /api/v1/reminders - Merge the reminder schedule
//! - POST /api/v1/reminders/times - Add a custom time
//! - DELETE /api/v1/reminders/times/:time - Remove a custom time
//! - GET /api/v1/reminders/next - When the next reminder is due

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{AddTimeRequest, DayQuery, NextReminderResponse, RemindersPatch};
use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::reminders::next_reminder;
use crate::storage::ReminderSettings;
use crate::tracker::validation::{insert_time_sorted, validate_new_time, validate_reminder_settings};
use crate::websocket::WsEvent;

/// GET /api/v1/reminders
pub async fn get_reminders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<ReminderSettings>> {
    Ok(Json(state.storage.load(&user_id).await?))
}

/// PUT /api/v1/reminders
pub async fn update_reminders(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(patch): Json<RemindersPatch>,
) -> ApiResult<Json<ReminderSettings>> {
    let mut settings: ReminderSettings = state.storage.load(&user_id).await?;
    patch.apply(&mut settings);
    validate_reminder_settings(&settings)?;
    settings.custom_times.sort();

    save(&state, &user_id, &settings).await?;
    Ok(Json(settings))
}

/// POST /api/v1/reminders/times
pub async fn add_time(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<AddTimeRequest>,
) -> ApiResult<Json<ReminderSettings>> {
    let mut settings: ReminderSettings = state.storage.load(&user_id).await?;
    let time = validate_new_time(req.time.trim(), &settings.custom_times)?;
    insert_time_sorted(&mut settings.custom_times, time);

    save(&state, &user_id, &settings).await?;
    Ok(Json(settings))
}

/// DELETE /api/v1/reminders/times/:time
pub async fn remove_time(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(time): Path<String>,
) -> ApiResult<Json<ReminderSettings>> {
    let mut settings: ReminderSettings = state.storage.load(&user_id).await?;
    let pos = settings
        .custom_times
        .iter()
        .position(|t| *t == time)
        .ok_or_else(|| ApiError::NotFound(format!("Reminder time {} not found", time)))?;
    settings.custom_times.remove(pos);

    save(&state, &user_id, &settings).await?;
    Ok(Json(settings))
}

/// GET /api/v1/reminders/next
pub async fn get_next_reminder(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<DayQuery>,
) -> ApiResult<Json<NextReminderResponse>> {
    let offset = state.offset(query.tz_offset_minutes)?;
    let settings: ReminderSettings = state.storage.load(&user_id).await?;
    let last_drink = state
        .storage
        .latest_log(&user_id)
        .await?
        .map(|log| log.timestamp);

    let next_at = next_reminder(&settings, last_drink, Utc::now(), offset);
    Ok(Json(NextReminderResponse::new(&settings, next_at)))
}

async fn save(state: &AppState, user_id: &str, settings: &ReminderSettings) -> ApiResult<()> {
    state.storage.put_document(user_id, settings).await?;
    tracing::debug!(
        user_id = %user_id,
        mode = ?settings.mode,
        enabled = settings.enabled,
        "Reminder settings updated"
    );
    state
        .ws_hub
        .publish(WsEvent::reminders_updated(user_id, settings.clone()));
    state.reschedule(user_id).await;
    Ok(())
}
