//! `issuePopClaimProof` orchestration (spec §4.F), serialized under a
//! dedicated PoP lock distinct from the audit lock (spec §5 `popProofLock`).

use std::sync::Arc;

use tokio::sync::Mutex;
use wene_audit::AuditChain;
use wene_crypto::{decode_base58_fixed, hash_all, sha256_hex};
use wene_store::EventRepo;
use wene_types::constants::POP_DOMAIN_SEPARATOR;
use wene_types::{Actor, ActorType, CanonicalValue, PopChainEntry, PopProof, PopProofRequest};

use crate::chain::{decode_last_hash, PopChainStore};
use crate::config::PopSigner;
use crate::error::{PopError, PopResult};
use crate::message::{build_message, SignableFields};

pub struct PopService {
    events: EventRepo,
    chain_store: PopChainStore,
    audit: Arc<AuditChain>,
    signer: PopSigner,
    lock: Mutex<()>,
}

impl PopService {
    pub fn new(events: EventRepo, chain_store: PopChainStore, audit: Arc<AuditChain>, signer: PopSigner) -> Self {
        Self {
            events,
            chain_store,
            audit,
            signer,
            lock: Mutex::new(()),
        }
    }

    /// Exposed for readiness checks (spec §4.J) — not used by the issuance
    /// path itself, which calls `self.signer` directly.
    pub fn signer(&self) -> &PopSigner {
        &self.signer
    }

    pub async fn issue_pop_claim_proof(&self, request: &PopProofRequest, now_ms: i64) -> PopResult<PopProof> {
        let _guard = self.lock.lock().await;

        let grant: [u8; 32] = decode_base58_fixed(&request.grant)
            .map_err(|e| PopError::InvalidInput(format!("invalid grant: {e}")))?;
        let claimer: [u8; 32] = decode_base58_fixed(&request.claimer)
            .map_err(|e| PopError::InvalidInput(format!("invalid claimer: {e}")))?;

        let event = self
            .events
            .get(&request.event_id)
            .await?
            .ok_or(PopError::EventNotFound)?;
        if !event.state.accepts_claims() {
            return Err(PopError::EventNotPublished);
        }

        let signer_state = self.signer.state()?;

        let prev_hash_hex = self.chain_store.global_last_hash(&request.grant).await?;
        let stream_prev_hash_hex = self.chain_store.stream_last_hash(&request.grant).await?;
        let prev_hash = decode_last_hash(&prev_hash_hex)?;
        let stream_prev_hash = decode_last_hash(&stream_prev_hash_hex)?;

        let anchor = self
            .audit
            .append(
                "POP_CLAIM_PROOF_ANCHOR",
                &format!("pop:{}", request.event_id),
                Actor {
                    actor_type: ActorType::System,
                    id: "pop-signer".to_string(),
                },
                CanonicalValue::object([
                    ("grant", CanonicalValue::string(request.grant.clone())),
                    ("claimer", CanonicalValue::string(request.claimer.clone())),
                    (
                        "periodIndex",
                        CanonicalValue::string(request.period_index.to_string()),
                    ),
                ]),
            )
            .await?;
        let audit_hash_hex = anchor.entry_hash.clone();
        let audit_hash: [u8; 32] = hex::decode(&audit_hash_hex)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| PopError::InvalidInput("audit entry_hash malformed".to_string()))?;

        let issued_at = now_ms / 1000;
        let entry_hash = hash_all(&[
            POP_DOMAIN_SEPARATOR.as_bytes(),
            &prev_hash,
            &stream_prev_hash,
            &audit_hash,
            &grant,
            &claimer,
            &request.period_index.to_le_bytes(),
            &issued_at.to_le_bytes(),
        ]);
        let entry_hash_hex = hex::encode(entry_hash);

        let chain_entry = PopChainEntry {
            grant: request.grant.clone(),
            claimer: request.claimer.clone(),
            period_index: request.period_index,
            prev_hash: prev_hash_hex.clone(),
            stream_prev_hash: stream_prev_hash_hex.clone(),
            audit_hash: audit_hash_hex.clone(),
            entry_hash: entry_hash_hex.clone(),
            issued_at,
        };
        let iso = chrono::Utc::now().to_rfc3339();
        self.chain_store.advance(&request.grant, &iso, &chain_entry).await?;

        let message = build_message(&SignableFields {
            grant,
            claimer,
            period_index: request.period_index,
            prev_hash,
            stream_prev_hash,
            entry_hash,
        });
        let signature = signer_state.keypair.sign(&message);

        Ok(PopProof {
            message_base64: base64_encode(&message),
            signature_base64: base64_encode(&signature.to_bytes()),
            prev_hash: prev_hash_hex,
            stream_prev_hash: stream_prev_hash_hex,
            audit_hash: audit_hash_hex,
            entry_hash: entry_hash_hex,
            issued_at,
        })
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Recomputes `entry_hash` independently of the signer, for the benefit
/// of callers that only hold the chain entry (e.g. integrity tooling).
pub fn recompute_entry_hash_hex(entry: &PopChainEntry) -> PopResult<String> {
    let grant: [u8; 32] = decode_base58_fixed(&entry.grant)
        .map_err(|e| PopError::InvalidInput(format!("invalid grant: {e}")))?;
    let claimer: [u8; 32] = decode_base58_fixed(&entry.claimer)
        .map_err(|e| PopError::InvalidInput(format!("invalid claimer: {e}")))?;
    let prev_hash = decode_last_hash(&entry.prev_hash)?;
    let stream_prev_hash = decode_last_hash(&entry.stream_prev_hash)?;
    let audit_hash: [u8; 32] = hex::decode(&entry.audit_hash)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| PopError::InvalidInput("audit_hash malformed".to_string()))?;
    Ok(sha256_hex(
        &[
            POP_DOMAIN_SEPARATOR.as_bytes(),
            prev_hash.as_slice(),
            stream_prev_hash.as_slice(),
            audit_hash.as_slice(),
            grant.as_slice(),
            claimer.as_slice(),
            &entry.period_index.to_le_bytes(),
            &entry.issued_at.to_le_bytes(),
        ]
        .concat(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wene_audit::ImmutableSinkSet;
    use wene_store::MemoryKvStore;
    use wene_types::{Event, EventOwnerLink, EventState, ImmutableMode, OwnerSource};

    fn published_event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            title: "Test".to_string(),
            datetime: "2026-01-01T00:00:00Z".to_string(),
            host: "host".to_string(),
            state: EventState::Published,
            solana_mint: None,
            solana_authority: None,
            solana_grant_id: None,
            ticket_token_amount: 1,
            claim_interval_days: 7,
            max_claims_per_interval: None,
            risk_profile: None,
        }
    }

    fn signer_with_seed() -> PopSigner {
        let seed_b64 = {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD.encode([7u8; 32])
        };
        PopSigner::new(crate::config::PopSignerConfig {
            secret_key_b64: Some(seed_b64),
            pubkey_b58: None,
            enforce_onchain_pop: true,
        })
    }

    #[tokio::test]
    async fn issues_a_169_byte_message_starting_with_version_byte() {
        let store: Arc<dyn wene_store::KvStore> = Arc::new(MemoryKvStore::new());
        let events = EventRepo::new(store.clone());
        events
            .create(
                published_event("evt-1"),
                EventOwnerLink {
                    event_id: "evt-1".to_string(),
                    admin_id: "op".to_string(),
                    name: "Op".to_string(),
                    source: OwnerSource::Master,
                    linked_at: 0,
                },
            )
            .await
            .unwrap();
        let audit = Arc::new(AuditChain::new(
            store.clone(),
            ImmutableSinkSet::none(),
            ImmutableMode::Off,
            "wene",
        ));
        let service = PopService::new(
            events,
            PopChainStore::new(store.clone()),
            audit.clone(),
            signer_with_seed(),
        );

        let grant = wene_crypto::Keypair::generate().public_key_base58();
        let claimer = wene_crypto::Keypair::generate().public_key_base58();
        let proof = service
            .issue_pop_claim_proof(
                &PopProofRequest {
                    event_id: "evt-1".to_string(),
                    grant,
                    claimer,
                    period_index: 0,
                },
                1_000,
            )
            .await
            .unwrap();

        let decoded = {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&proof.message_base64)
                .unwrap()
        };
        assert_eq!(decoded.len(), 169);
        assert_eq!(decoded[0], 0x02);
        assert_eq!(proof.prev_hash, wene_types::constants::GENESIS);
        assert_eq!(proof.entry_hash.len(), 64);
    }
}
