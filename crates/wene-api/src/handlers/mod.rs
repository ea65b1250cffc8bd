//! Route handlers, grouped by surface (spec §6).

pub mod admin;
pub mod audit;
pub mod claims;
pub mod master;
pub mod school;

use axum::http::HeaderMap;
use wene_types::AdminRole;

use crate::error::ApiError;
use crate::state::AppState;

/// Pulls the bearer token out of `Authorization` and resolves it to an
/// [`AdminRole`] via [`wene_identity::IdentityService`].
pub async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<AdminRole, ApiError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|raw| raw.trim_start_matches("Bearer ").trim_start_matches("bearer ").trim())
        .ok_or(ApiError::Unauthorized)?;
    Ok(state.identity.resolve(token).await?)
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
