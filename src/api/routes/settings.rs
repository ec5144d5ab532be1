//! Settings Routes
//!
//! - GET /api/v1/settings - Display settings
//! - PUT /api/v1/settings - Merge display settings
//! - GET /api/v1/notifications - Notification flags
//! - PUT /api/v1/notifications - Merge notification flags

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{NotificationsPatch, SettingsPatch};
use crate::api::error::ApiResult;
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::storage::{NotificationSettings, UserSettings};
use crate::websocket::WsEvent;

/// GET /api/v1/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<UserSettings>> {
    Ok(Json(state.storage.load(&user_id).await?))
}

/// PUT /api/v1/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(patch): Json<SettingsPatch>,
) -> ApiResult<Json<UserSettings>> {
    let mut settings: UserSettings = state.storage.load(&user_id).await?;
    patch.apply(&mut settings);

    state.storage.put_document(&user_id, &settings).await?;
    tracing::debug!(user_id = %user_id, "Settings updated");
    state
        .ws_hub
        .publish(WsEvent::settings_updated(&user_id, settings));

    Ok(Json(settings))
}

/// GET /api/v1/notifications
pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<NotificationSettings>> {
    Ok(Json(state.storage.load(&user_id).await?))
}

/// PUT /api/v1/notifications
pub async fn update_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(patch): Json<NotificationsPatch>,
) -> ApiResult<Json<NotificationSettings>> {
    let mut notifications: NotificationSettings = state.storage.load(&user_id).await?;
    patch.apply(&mut notifications);

    state.storage.put_document(&user_id, &notifications).await?;
    tracing::debug!(user_id = %user_id, "Notification preferences updated");
    state
        .ws_hub
        .publish(WsEvent::notifications_updated(&user_id, notifications));

    Ok(Json(notifications))
}
