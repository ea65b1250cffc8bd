//! `/v1/school/events*` handlers (spec §6).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use wene_types::{Event, EventOwnerLink, EventState, OwnerSource, RiskProfile};

use super::{now_ms, resolve_caller};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub scope: Option<String>,
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<Event>>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    let events = state.events.list().await?;
    let events = if query.scope.as_deref() == Some("mine") {
        state.ownership.filter_mine(&caller, events).await?
    } else {
        events
    };
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    state.events.get(&event_id).await?.map(Json).ok_or(ApiError::NotFound)
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub datetime: String,
    pub host: String,
    pub ticket_token_amount: u64,
    pub claim_interval_days: u32,
    #[serde(default)]
    pub max_claims_per_interval: Option<u32>,
    #[serde(default)]
    pub solana_mint: Option<String>,
    #[serde(default)]
    pub solana_authority: Option<String>,
    #[serde(default)]
    pub solana_grant_id: Option<String>,
    #[serde(default)]
    pub risk_profile: Option<RiskProfile>,
}

#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub event: Event,
}

fn owner_source(caller: &wene_types::AdminRole) -> OwnerSource {
    match caller {
        wene_types::AdminRole::Master => OwnerSource::Master,
        wene_types::AdminRole::Demo => OwnerSource::Demo,
        wene_types::AdminRole::Invited { .. } => OwnerSource::Invite,
    }
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CreateEventResponse>), ApiError> {
    let caller = resolve_caller(&state, &headers).await?;

    if let (Some(mint), Some(authority), Some(grant)) = (
        request.solana_mint.as_deref(),
        request.solana_authority.as_deref(),
        request.solana_grant_id.as_deref(),
    ) {
        if state.events.triple_in_use((mint, authority, grant)).await? {
            return Err(ApiError::Conflict);
        }
    }

    let event_id = uuid::Uuid::new_v4().to_string();
    let event = Event {
        id: event_id.clone(),
        title: request.title,
        datetime: request.datetime,
        host: request.host,
        state: EventState::Draft,
        solana_mint: request.solana_mint,
        solana_authority: request.solana_authority,
        solana_grant_id: request.solana_grant_id,
        ticket_token_amount: request.ticket_token_amount,
        claim_interval_days: request.claim_interval_days,
        max_claims_per_interval: request.max_claims_per_interval,
        risk_profile: request.risk_profile,
    };
    let owner = EventOwnerLink {
        event_id: event_id.clone(),
        admin_id: caller.admin_id().unwrap_or("master").to_string(),
        name: caller.admin_id().unwrap_or("master").to_string(),
        source: owner_source(&caller),
        linked_at: now_ms(),
    };
    state.events.create(event.clone(), owner).await?;

    Ok((StatusCode::CREATED, Json(CreateEventResponse { event })))
}

pub async fn claimants(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<wene_types::Claim>>, ApiError> {
    let caller = resolve_caller(&state, &headers).await?;
    state.events.get(&event_id).await?.ok_or(ApiError::NotFound)?;
    state.ownership.authorize(&caller, &event_id).await?;
    let claimants = state.claims_repo.claimants(&event_id).await?;
    Ok(Json(claimants))
}
