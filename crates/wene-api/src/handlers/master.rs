//! `/api/master/*` handlers — disclosure, search, and audit integrity,
//! all master-only (spec §4.H, §6).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use wene_audit::IntegrityReport;
use wene_search::{AdminDisclosure, SearchDoc};
use wene_types::constants::AUDIT_HISTORY_PAGE_SIZE;

use super::resolve_caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DisclosureQuery {
    #[serde(default)]
    pub include_revoked: bool,
    #[serde(default = "default_transfer_window")]
    pub transfer_window: usize,
}

fn default_transfer_window() -> usize {
    AUDIT_HISTORY_PAGE_SIZE
}

pub async fn admin_disclosures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DisclosureQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<AdminDisclosure>>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    let records = state
        .search
        .disclosure_for_master(&caller, query.include_revoked, query.transfer_window)
        .await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub include_revoked: bool,
    #[serde(default = "default_transfer_window")]
    pub transfer_window: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub doc: SearchDoc,
    pub score: i64,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    let hits = state
        .search
        .search(&caller, &query.q, query.include_revoked, query.transfer_window, query.limit)
        .await?;
    Ok(Json(hits.into_iter().map(|(doc, score)| SearchHit { doc, score }).collect()))
}

#[derive(Debug, Deserialize)]
pub struct AuditIntegrityQuery {
    #[serde(default = "default_integrity_limit")]
    pub limit: usize,
    #[serde(default)]
    pub verify_immutable: bool,
}

fn default_integrity_limit() -> usize {
    AUDIT_HISTORY_PAGE_SIZE
}

pub async fn audit_integrity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditIntegrityQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<IntegrityReport>), ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    if !caller.is_master() {
        return Err(ApiError::Forbidden);
    }
    let report = state.audit.verify_integrity(query.limit, query.verify_immutable).await?;
    let status = if report.ok { StatusCode::OK } else { StatusCode::CONFLICT };
    Ok((status, Json(report)))
}

pub async fn audit_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<wene_types::AuditEntry>>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    if !caller.is_master() {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(state.audit.recent().await?))
}
