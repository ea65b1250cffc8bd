//! Audit entry and actor types (spec §3 `AuditEntry`, §4.C).

use serde::{Deserialize, Serialize};

use crate::value::CanonicalValue;

/// Who initiated a mutation, attached to every [`AuditEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    Operator,
    Auditor,
    Wallet,
    User,
    School,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "type")]
    pub actor_type: ActorType,
    pub id: String,
}

/// One immutable, hash-linked record of a single mutating event.
///
/// `entry_hash = SHA-256(canon({ts, event, event_id, actor, data, prev_hash,
/// stream_prev_hash}))`. `prev_hash` is the prior global head or
/// `"GENESIS"`; `stream_prev_hash` is the prior head of the same `event_id`
/// stream or `"GENESIS"`. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// ISO-8601 timestamp.
    pub ts: String,
    pub event: String,
    pub event_id: String,
    pub actor: Actor,
    pub data: CanonicalValue,
    pub prev_hash: String,
    pub stream_prev_hash: String,
    pub entry_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immutable: Option<crate::receipt::ImmutableReceipt>,
}

impl AuditEntry {
    /// The fields that feed `entry_hash`, in canonical form, excluding
    /// `entry_hash` and `immutable` themselves.
    pub fn hash_input(&self) -> CanonicalValue {
        CanonicalValue::object([
            ("ts", CanonicalValue::string(self.ts.clone())),
            ("event", CanonicalValue::string(self.event.clone())),
            ("eventId", CanonicalValue::string(self.event_id.clone())),
            (
                "actor",
                CanonicalValue::object([
                    (
                        "type",
                        CanonicalValue::string(match self.actor.actor_type {
                            ActorType::Operator => "operator",
                            ActorType::Auditor => "auditor",
                            ActorType::Wallet => "wallet",
                            ActorType::User => "user",
                            ActorType::School => "school",
                            ActorType::System => "system",
                        }),
                    ),
                    ("id", CanonicalValue::string(self.actor.id.clone())),
                ]),
            ),
            ("data", self.data.clone()),
            ("prev_hash", CanonicalValue::string(self.prev_hash.clone())),
            (
                "stream_prev_hash",
                CanonicalValue::string(self.stream_prev_hash.clone()),
            ),
        ])
    }
}
