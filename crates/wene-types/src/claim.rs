//! Claim record (spec §3 `Claim`).

use serde::{Deserialize, Serialize};

/// A single participation claim keyed by `(event_id, subject)`.
///
/// `subject` is the whitespace-normalized wallet address, join token, or
/// user id that identifies the claimant; it is opaque to this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub event_id: String,
    pub subject: String,
    /// Milliseconds since epoch.
    pub claimed_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<String>,
}

/// Outcome of `submit_claim`, folded into a result rather than an error —
/// rate-limited resubmission is a normal, successful outcome (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub already_joined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<String>,
}
