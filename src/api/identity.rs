//! Caller identity
//!
//! Authentication happens upstream. The identity provider or gateway in
//! front of the service sets a trusted header carrying the user id.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;

/// Authenticated user id taken from the identity header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = state.config.identity_header.as_str();

        let user_id = parts
            .headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", header)))?;

        Ok(CurrentUser(user_id.to_string()))
    }
}
