//! Event and event-ownership types (spec §3 `Event`, `EventOwnerLink`).

use serde::{Deserialize, Serialize};

/// Lifecycle state of an [`Event`]. `draft -> published -> ended`; `ended`
/// is terminal. Claims are only accepted while `published`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    Draft,
    Published,
    Ended,
}

impl EventState {
    pub fn accepts_claims(self) -> bool {
        matches!(self, EventState::Published)
    }
}

/// On-chain risk annotation, free-form and optional.
pub type RiskProfile = serde_json::Value;

/// An event that participants can claim a ticket for.
///
/// Created by an operator, mutated only through admin endpoints, never
/// deleted. The triple `(solana_mint, solana_authority, solana_grant_id)`,
/// when all three are present, must be globally unique across events —
/// enforced by the store at creation time, not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub datetime: String,
    pub host: String,
    pub state: EventState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solana_mint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solana_authority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solana_grant_id: Option<String>,
    pub ticket_token_amount: u64,
    pub claim_interval_days: u32,
    /// `None` means unlimited claims per interval.
    pub max_claims_per_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_profile: Option<RiskProfile>,
}

impl Event {
    /// The on-chain identity triple used for the global-uniqueness invariant.
    /// `None` unless all three fields are present.
    pub fn onchain_triple(&self) -> Option<(&str, &str, &str)> {
        match (
            &self.solana_mint,
            &self.solana_authority,
            &self.solana_grant_id,
        ) {
            (Some(m), Some(a), Some(g)) => Some((m, a, g)),
            _ => None,
        }
    }
}

/// Who created an [`Event`] and by what authentication path, immutable once
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerSource {
    Master,
    Invite,
    Demo,
}

/// `eventId -> owning operator` link, used for `scope=mine` filtering and
/// per-event admin authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOwnerLink {
    pub event_id: String,
    pub admin_id: String,
    pub name: String,
    pub source: OwnerSource,
    pub linked_at: i64,
}
