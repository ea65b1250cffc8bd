//! Proof-of-Participation chain and proof types (spec §3 `PopChainEntry`,
//! §4.F).

use serde::{Deserialize, Serialize};

/// One link of a per-grant PoP chain, persisted at
/// `pop_chain:history:<iso>:<entry_hash>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopChainEntry {
    pub grant: String,
    pub claimer: String,
    pub period_index: u64,
    pub prev_hash: String,
    pub stream_prev_hash: String,
    pub audit_hash: String,
    pub entry_hash: String,
    /// Seconds since epoch.
    pub issued_at: i64,
}

/// Caller-supplied request to issue a PoP claim proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopProofRequest {
    pub event_id: String,
    /// Base58-encoded 32-byte Ed25519 public key of the issuing authority.
    pub grant: String,
    /// Base58-encoded 32-byte Ed25519 public key of the recipient.
    pub claimer: String,
    pub period_index: u64,
}

/// Result of `issuePopClaimProof`: the signed 169-byte message plus every
/// hash in the chain, all hex-encoded except the base64 message/signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopProof {
    pub message_base64: String,
    pub signature_base64: String,
    pub prev_hash: String,
    pub stream_prev_hash: String,
    pub audit_hash: String,
    pub entry_hash: String,
    pub issued_at: i64,
}
