//! Achievement Routes
//!
//! - GET /api/v1/achievements - Catalog with unlock state

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::AchievementsResponse;
use crate::api::error::ApiResult;
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::tracker::achievements::catalog_status;

/// GET /api/v1/achievements
pub async fn list_achievements(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<AchievementsResponse>> {
    let unlocked = state.storage.achievements(&user_id).await?;
    let achievements = catalog_status(&unlocked);

    Ok(Json(AchievementsResponse {
        unlocked: achievements.iter().filter(|a| a.unlocked).count(),
        total: achievements.len(),
        achievements,
    }))
}
