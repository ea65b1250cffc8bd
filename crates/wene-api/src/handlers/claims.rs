//! Claim submission, PoP proof issuance, user registration, and their
//! status/verify siblings (spec §6).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use wene_receipts::ClaimChannel;
use wene_types::{ParticipationReceipt, PopProof, PopProofRequest};

use super::now_ms;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_receipt: Option<ParticipationReceipt>,
}

#[derive(Debug, Deserialize)]
pub struct UserClaimRequest {
    pub subject: String,
}

/// `POST /api/events/:eventId/claim`.
pub async fn claim_by_user(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(request): Json<UserClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let (outcome, receipt) = state
        .claims
        .submit_claim(
            ClaimChannel::User,
            &event_id,
            &request.subject,
            now_ms(),
            "/api/audit/receipts/verify",
        )
        .await?;
    Ok(Json(ClaimResponse {
        status: if outcome.already_joined { "already" } else { "created" },
        confirmation_code: outcome.confirmation_code,
        ticket_receipt: receipt,
    }))
}

#[derive(Debug, Deserialize)]
pub struct WalletClaimRequest {
    pub event_id: String,
    pub wallet_address: String,
}

/// `POST /v1/school/claims` — the `SchoolClaimResult` shape (spec §6).
pub async fn claim_by_wallet(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WalletClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let (outcome, receipt) = state
        .claims
        .submit_claim(
            ClaimChannel::Wallet,
            &request.event_id,
            &request.wallet_address,
            now_ms(),
            "/api/audit/receipts/verify",
        )
        .await?;
    Ok(Json(ClaimResponse {
        status: if outcome.already_joined { "already" } else { "created" },
        confirmation_code: outcome.confirmation_code,
        ticket_receipt: receipt,
    }))
}

/// `POST /v1/school/pop-proof`.
pub async fn pop_proof(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PopProofRequest>,
) -> Result<Json<PopProof>, ApiError> {
    Ok(Json(state.pop.issue_pop_claim_proof(&request, now_ms()).await?))
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub user_id: String,
    pub display_name: String,
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterUserResponse {
    pub user_id: String,
    pub display_name: String,
}

/// `POST /api/users/register`.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(axum::http::StatusCode, Json<RegisterUserResponse>), ApiError> {
    let pin_hash = wene_crypto::sha256_hex(request.pin.as_bytes());
    let user = state
        .users
        .register(&request.user_id, &request.display_name, &pin_hash, now_ms())
        .await
        .map_err(|_| ApiError::Conflict)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(RegisterUserResponse {
            user_id: user.user_id,
            display_name: user.display_name,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyAuthRequest {
    pub user_id: String,
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyAuthResponse {
    pub verified: bool,
}

/// `POST /api/auth/verify`.
pub async fn verify_auth(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyAuthRequest>,
) -> Result<Json<VerifyAuthResponse>, ApiError> {
    let pin_hash = wene_crypto::sha256_hex(request.pin.as_bytes());
    let verified = state.users.verify_pin(&request.user_id, &pin_hash).await?;
    if !verified {
        return Err(ApiError::Unauthorized);
    }
    Ok(Json(VerifyAuthResponse { verified }))
}
