//! `/api/audit/receipts/*` verification and the public metadata endpoint
//! (spec §6).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use wene_receipts::verify_receipt;
use wene_types::{ParticipationReceipt, VerificationResult};

use crate::error::ApiError;
use crate::state::AppState;

fn verification_status(result: &VerificationResult) -> StatusCode {
    if result.ok {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    }
}

/// `POST /api/audit/receipts/verify` — the caller supplies the full
/// receipt body, freshly re-verified against the live chain.
pub async fn verify_receipt_body(
    State(state): State<Arc<AppState>>,
    Json(receipt): Json<ParticipationReceipt>,
) -> Result<(StatusCode, Json<VerificationResult>), ApiError> {
    let result = verify_receipt(&receipt, &state.audit).await?;
    Ok((verification_status(&result), Json(result)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyByCodeRequest {
    pub event_id: String,
    pub confirmation_code: String,
}

/// `POST /api/audit/receipts/verify-code` — looks the receipt up by
/// `(event_id, confirmation_code)` first, then runs the same verification.
pub async fn verify_receipt_by_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyByCodeRequest>,
) -> Result<(StatusCode, Json<VerificationResult>), ApiError> {
    let receipt = state
        .receipts
        .by_code(&request.event_id, &request.confirmation_code)
        .await?
        .ok_or(ApiError::NotFound)?;
    let result = verify_receipt(&receipt, &state.audit).await?;
    Ok((verification_status(&result), Json(result)))
}

/// `GET /metadata/<mint>.json` — base58, 32-44 chars, else 400. The
/// metadata body itself is the event the mint is bound to.
pub async fn mint_metadata(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<wene_types::Event>, ApiError> {
    let mint = filename.strip_suffix(".json").unwrap_or(&filename);
    if mint.len() < 32 || mint.len() > 44 || !mint.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::BadRequest("mint must be base58, 32-44 chars".to_string()));
    }
    for event in state.events.list().await? {
        if event.solana_mint.as_deref() == Some(mint) {
            return Ok(Json(event));
        }
    }
    Err(ApiError::NotFound)
}
