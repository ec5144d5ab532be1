//! Goal Routes
//!
//! - GET /api/v1/goal - Current daily goal
//! - PUT /api/v1/goal - Replace the daily goal

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::GoalRequest;
use crate::api::error::ApiResult;
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::storage::DailyGoal;
use crate::tracker::validation::validate_goal;
use crate::websocket::WsEvent;

/// GET /api/v1/goal
pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<DailyGoal>> {
    Ok(Json(state.storage.load(&user_id).await?))
}

/// PUT /api/v1/goal
pub async fn set_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<GoalRequest>,
) -> ApiResult<Json<DailyGoal>> {
    let goal = DailyGoal {
        amount: validate_goal(req.amount)?,
    };

    state.storage.put_document(&user_id, &goal).await?;
    tracing::info!(user_id = %user_id, goal_ml = goal.amount, "Daily goal updated");
    state.ws_hub.publish(WsEvent::goal_updated(&user_id, goal));

    Ok(Json(goal))
}
