//! Transfer-audit projection (spec §4.H): normalizes `USER_CLAIM` /
//! `WALLET_CLAIM` audit entries into a uniform payload, structured
//! `data.transfer` taking precedence over the legacy flat fallback.

use serde::{Deserialize, Serialize};
use wene_types::{AuditEntry, CanonicalValue};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferAuditPayload {
    pub grant: String,
    pub solana_mint: Option<String>,
    pub ticket_token_amount: Option<i64>,
    pub tx_signature: Option<String>,
    pub receipt_pubkey: Option<String>,
    pub recipient: Option<String>,
    /// Present only in the master view; the admin view strips this field.
    pub pii: Option<CanonicalValue>,
}

impl TransferAuditPayload {
    /// The admin-role view: identical except `pii` is dropped.
    pub fn redacted(&self) -> Self {
        Self { pii: None, ..self.clone() }
    }

    /// Grouping key for related-user clustering (spec §4.H disclosure):
    /// `userId | walletAddress | joinToken | recipient`, whichever the
    /// transfer payload actually carries.
    pub fn grouping_key(&self) -> Option<&str> {
        self.recipient.as_deref()
    }
}

fn string_field(value: &CanonicalValue, key: &str) -> Option<String> {
    value.field(key).and_then(CanonicalValue::as_str).map(str::to_string)
}

fn int_field(value: &CanonicalValue, key: &str) -> Option<i64> {
    match value.field(key) {
        Some(CanonicalValue::Number(n)) => n.as_i64(),
        Some(CanonicalValue::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Projects a transfer-class audit entry into a [`TransferAuditPayload`],
/// `None` if the entry isn't `USER_CLAIM`/`WALLET_CLAIM`.
pub fn project_transfer(entry: &AuditEntry) -> Option<TransferAuditPayload> {
    if entry.event != "USER_CLAIM" && entry.event != "WALLET_CLAIM" {
        return None;
    }

    if let Some(structured) = entry.data.field("transfer") {
        return Some(TransferAuditPayload {
            grant: string_field(structured, "grant").unwrap_or_else(|| format!("grant:{}", entry.event_id)),
            solana_mint: string_field(structured, "solanaMint"),
            ticket_token_amount: int_field(structured, "ticketTokenAmount"),
            tx_signature: string_field(structured, "txSignature"),
            receipt_pubkey: string_field(structured, "receiptPubkey"),
            recipient: string_field(structured, "recipient"),
            pii: structured.field("pii").cloned(),
        });
    }

    // Legacy fallback: no nested `transfer` object, fields sit directly on
    // `data`. `grant` prefers the entry's Solana authority; falling back
    // to a synthetic per-event grant id keeps grouping stable when the
    // authority was never recorded.
    Some(TransferAuditPayload {
        grant: string_field(&entry.data, "solanaAuthority").unwrap_or_else(|| format!("grant:{}", entry.event_id)),
        solana_mint: string_field(&entry.data, "solanaMint"),
        ticket_token_amount: int_field(&entry.data, "ticketTokenAmount"),
        tx_signature: string_field(&entry.data, "txSignature"),
        receipt_pubkey: string_field(&entry.data, "receiptPubkey"),
        recipient: string_field(&entry.data, "recipient"),
        pii: entry.data.field("pii").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wene_types::{Actor, ActorType};

    fn entry(event: &str, data: CanonicalValue) -> AuditEntry {
        AuditEntry {
            ts: "2026-01-01T00:00:00Z".to_string(),
            event: event.to_string(),
            event_id: "evt-1".to_string(),
            actor: Actor { actor_type: ActorType::User, id: "u1".to_string() },
            data,
            prev_hash: "GENESIS".to_string(),
            stream_prev_hash: "GENESIS".to_string(),
            entry_hash: "h".to_string(),
            immutable: None,
        }
    }

    #[test]
    fn non_transfer_events_project_to_none() {
        let e = entry("USER_REGISTER", CanonicalValue::object([]));
        assert!(project_transfer(&e).is_none());
    }

    #[test]
    fn structured_transfer_takes_precedence() {
        let data = CanonicalValue::object([(
            "transfer",
            CanonicalValue::object([
                ("grant", CanonicalValue::string("grant-abc")),
                ("recipient", CanonicalValue::string("wallet-xyz")),
                ("pii", CanonicalValue::string("secret")),
            ]),
        )]);
        let payload = project_transfer(&entry("USER_CLAIM", data)).unwrap();
        assert_eq!(payload.grant, "grant-abc");
        assert_eq!(payload.recipient.as_deref(), Some("wallet-xyz"));
        assert!(payload.pii.is_some());
        assert!(payload.redacted().pii.is_none());
    }

    #[test]
    fn legacy_fallback_synthesizes_grant_when_authority_missing() {
        let data = CanonicalValue::object([("recipient", CanonicalValue::string("wallet-xyz"))]);
        let payload = project_transfer(&entry("WALLET_CLAIM", data)).unwrap();
        assert_eq!(payload.grant, "grant:evt-1");
    }
}
