//! `/api/admin/*` handlers: login, invite lifecycle, invite listing (spec
//! §4.G, §6). These four routes are the fail-closed preflight's exemption
//! set — auth has to keep working even with the primary audit sink down.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use wene_search::AdminDisclosure;
use wene_types::constants::AUDIT_HISTORY_PAGE_SIZE;
use wene_types::AdminRole;

use super::{now_ms, resolve_caller};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub role: AdminRole,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let role = state.identity.resolve(&request.token).await?;
    Ok(Json(LoginResponse { role }))
}

#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateInviteResponse {
    pub token: String,
    pub admin_id: String,
    pub name: String,
}

pub async fn create_invite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<CreateInviteResponse>), ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    let (token, record) = state.invites.create(&caller, &request.name, now_ms()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateInviteResponse { token, admin_id: record.admin_id, name: record.name }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RenameInviteRequest {
    pub token: String,
    pub name: String,
}

pub async fn rename_invite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RenameInviteRequest>,
) -> Result<Json<wene_types::AdminCodeRecord>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    let record = state.invites.rename(&caller, &request.token, &request.name).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct RevokeInviteRequest {
    pub token: String,
}

pub async fn revoke_invite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RevokeInviteRequest>,
) -> Result<Json<wene_types::AdminCodeRecord>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    let revoked_by = caller.admin_id().unwrap_or("master").to_string();
    let record = state.invites.revoke(&caller, &request.token, &revoked_by, now_ms()).await?;
    Ok(Json(record))
}

/// `GET /api/admin/invites` — every issued invite, master or demo visible
/// (an invited admin cannot enumerate its peers).
pub async fn list_invites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<wene_types::AdminCodeRecord>>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    if !caller.is_master() {
        return Err(ApiError::Forbidden);
    }
    let records = state.admin_codes.list().await?.into_iter().map(|(_, record)| record).collect();
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct TransfersQuery {
    #[serde(default)]
    pub include_revoked: bool,
    #[serde(default = "default_transfer_window")]
    pub transfer_window: usize,
}

fn default_transfer_window() -> usize {
    AUDIT_HISTORY_PAGE_SIZE
}

/// `GET /api/admin/transfers` — the caller's own disclosure record (or, for
/// master, every record), with related-transfer PII redacted.
pub async fn transfers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransfersQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<AdminDisclosure>>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    let records = state.search.disclosure_for_admin(&caller, query.include_revoked, query.transfer_window).await?;
    Ok(Json(records))
}
