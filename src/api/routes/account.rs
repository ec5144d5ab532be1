//! Account Routes
//!
//! - DELETE /api/v1/account - Delete every record of the caller

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{DeleteAccountRequest, DeleteAccountResponse};
use crate::api::error::ApiResult;
use crate::api::identity::CurrentUser;
use crate::api::state::AppState;
use crate::tracker::validation::validate_delete_confirmation;

/// DELETE /api/v1/account
///
/// Body must be `{"confirm": "DELETE"}`.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<DeleteAccountRequest>,
) -> ApiResult<Json<DeleteAccountResponse>> {
    validate_delete_confirmation(&req.confirm)?;

    let deleted = state.storage.delete_user(&user_id).await?;
    if let Some(scheduler) = &state.scheduler {
        scheduler.forget(&user_id).await;
    }

    tracing::warn!(
        user_id = %user_id,
        logs = deleted.logs,
        documents = deleted.documents,
        achievements = deleted.achievements,
        "Account deleted"
    );

    Ok(Json(DeleteAccountResponse {
        status: "deleted".to_string(),
        deleted,
    }))
}
