//! Immutable-sink and participation receipt types (spec §3, §4.B, §4.E).

use serde::{Deserialize, Serialize};

use crate::audit::AuditEntry;

/// Immutable-fan-out mode (spec §4.B). Parsed case-insensitively from the
/// `AUDIT_IMMUTABLE_MODE` environment variable by `wene-audit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmutableMode {
    Off,
    BestEffort,
    Required,
}

impl ImmutableMode {
    /// Case-insensitive parse matching spec §4.B's mode table; unrecognized
    /// or empty input defaults to `Required` (the fail-closed default).
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" => ImmutableMode::Required,
            "off" | "false" | "0" | "disabled" | "no" => ImmutableMode::Off,
            "best_effort" | "best-effort" | "relaxed" | "warn" => ImmutableMode::BestEffort,
            _ => ImmutableMode::Required,
        }
    }
}

/// The kind of external sink a fan-out attempt succeeded or failed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    R2Entry,
    R2Stream,
    KvIndex,
    ImmutableIngest,
}

/// Record of one sink accepting (or being attempted for) an audit entry's
/// payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkRecord {
    pub sink: SinkKind,
    #[serde(rename = "ref")]
    pub sink_ref: String,
    pub at: String,
}

/// Evidence that an audit entry's byte-exact canonical payload reached one
/// or more external sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmutableReceipt {
    pub mode: ImmutableMode,
    pub payload_hash: String,
    pub sinks: Vec<SinkRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// User-holdable certificate binding a confirmation code and event to an
/// audit entry by hash (spec §3 `ParticipationReceipt`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipationReceipt {
    pub version: u8,
    #[serde(rename = "type")]
    pub receipt_type: String,
    /// Equal to the binding audit entry's `entry_hash`.
    pub receipt_id: String,
    /// `SHA-256(canon(self \ {receipt_hash}))`.
    pub receipt_hash: String,
    pub issued_at: String,
    pub confirmation_code: String,
    pub event_id: String,
    /// `SHA-256(canon({version:1, event_id, subject}))`, a commitment to the
    /// subject that does not reveal it.
    pub subject_commitment: String,
    pub verify_endpoint: String,
    pub audit: AuditEntry,
}

impl ParticipationReceipt {
    /// Canonical form used to compute `receipt_hash`: every field except
    /// `receipt_hash` itself.
    pub fn hash_input(&self) -> crate::value::CanonicalValue {
        use crate::value::CanonicalValue as V;
        V::object([
            ("version", V::Number(serde_json::Number::from(self.version))),
            ("type", V::string(self.receipt_type.clone())),
            ("receiptId", V::string(self.receipt_id.clone())),
            ("issuedAt", V::string(self.issued_at.clone())),
            (
                "confirmationCode",
                V::string(self.confirmation_code.clone()),
            ),
            ("eventId", V::string(self.event_id.clone())),
            (
                "subjectCommitment",
                V::string(self.subject_commitment.clone()),
            ),
            ("verifyEndpoint", V::string(self.verify_endpoint.clone())),
            ("audit", serde_json::to_value(&self.audit).unwrap_or(serde_json::Value::Null).into()),
        ])
    }
}
