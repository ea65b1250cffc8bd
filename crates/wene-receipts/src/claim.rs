//! `submit_claim` orchestration (spec §4.D, §4.E): rate-window eligibility,
//! confirmation-code reservation, audit append, receipt construction.

use std::sync::Arc;

use wene_audit::AuditChain;
use wene_store::{ClaimRepo, EventRepo};
use wene_types::{Actor, ActorType, CanonicalValue, Claim, ClaimOutcome, Event, EventState, ParticipationReceipt};

use crate::codes::ConfirmationCodeReservation;
use crate::error::{ReceiptError, ReceiptResult};
use crate::receipts::ReceiptStore;

/// Which `event` name an audit append uses, chosen by the caller
/// (`USER_CLAIM` vs `WALLET_CLAIM`, spec §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimChannel {
    User,
    Wallet,
}

impl ClaimChannel {
    fn audit_event_name(self) -> &'static str {
        match self {
            ClaimChannel::User => "USER_CLAIM",
            ClaimChannel::Wallet => "WALLET_CLAIM",
        }
    }

    fn actor_type(self) -> ActorType {
        match self {
            ClaimChannel::User => ActorType::User,
            ClaimChannel::Wallet => ActorType::Wallet,
        }
    }
}

pub struct ClaimService {
    events: EventRepo,
    claims: ClaimRepo,
    codes: ConfirmationCodeReservation,
    receipts: ReceiptStore,
    chain: Arc<AuditChain>,
}

impl ClaimService {
    pub fn new(
        events: EventRepo,
        claims: ClaimRepo,
        codes: ConfirmationCodeReservation,
        receipts: ReceiptStore,
        chain: Arc<AuditChain>,
    ) -> Self {
        Self {
            events,
            claims,
            codes,
            receipts,
            chain,
        }
    }

    /// The full claim algorithm (spec §4.D-§4.E):
    ///
    /// 1. Event must exist and be `published`.
    /// 2. Evaluate the trailing rate window; if exhausted, fold into
    ///    `already_joined=true` with the existing code — never an error.
    /// 3. Else reserve a confirmation code, append a `USER_CLAIM`/
    ///    `WALLET_CLAIM` audit entry, bind a receipt to it.
    pub async fn submit_claim(
        &self,
        channel: ClaimChannel,
        event_id: &str,
        subject: &str,
        now_ms: i64,
        verify_endpoint: &str,
    ) -> ReceiptResult<(ClaimOutcome, Option<ParticipationReceipt>)> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or(ReceiptError::NotFound)?;

        if !event.state.accepts_claims() {
            return Err(ReceiptError::Malformed(format!(
                "event {event_id} is not accepting claims ({:?})",
                event.state
            )));
        }

        let subject = normalize_subject(subject);
        if subject.is_empty() {
            return Err(ReceiptError::WalletRequired);
        }

        if let Some(existing_code) = self.rate_window_exhausted(&event, &subject, now_ms).await? {
            let receipt = self.receipts.by_code(event_id, &existing_code).await?;
            return Ok((
                ClaimOutcome {
                    already_joined: true,
                    confirmation_code: Some(existing_code),
                },
                receipt,
            ));
        }

        let code = self.codes.reserve(event_id, &subject, now_ms).await?;

        let claim = Claim {
            event_id: event_id.to_string(),
            subject: subject.clone(),
            claimed_at: now_ms,
            confirmation_code: Some(code.clone()),
        };
        self.claims.record(&claim).await?;

        let entry = self
            .chain
            .append(
                channel.audit_event_name(),
                event_id,
                Actor {
                    actor_type: channel.actor_type(),
                    id: subject.clone(),
                },
                CanonicalValue::object([
                    ("subject", CanonicalValue::string(subject.clone())),
                    ("confirmationCode", CanonicalValue::string(code.clone())),
                ]),
            )
            .await;

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                self.codes.release(&code, event_id, &subject).await?;
                return Err(ReceiptError::Audit(err));
            }
        };

        let receipt = self
            .receipts
            .build_and_persist(&entry, &subject, &code, verify_endpoint)
            .await?;

        Ok((
            ClaimOutcome {
                already_joined: false,
                confirmation_code: Some(code),
            },
            Some(receipt),
        ))
    }

    /// `None` if a new claim is permitted; `Some(existing_code)` if the
    /// trailing window is already at or past `max_claims_per_interval`.
    async fn rate_window_exhausted(
        &self,
        event: &Event,
        subject: &str,
        now_ms: i64,
    ) -> ReceiptResult<Option<String>> {
        let Some(limit) = event.max_claims_per_interval else {
            return Ok(None);
        };
        let window_start = now_ms - (event.claim_interval_days as i64) * 86_400_000;
        let history = self.claims.for_subject(&event.id, subject).await?;
        let in_window = history
            .iter()
            .filter(|c| c.claimed_at >= window_start)
            .count();
        if in_window >= limit as usize {
            let existing = history
                .iter()
                .rev()
                .find_map(|c| c.confirmation_code.clone());
            Ok(Some(existing.unwrap_or_default()))
        } else {
            Ok(None)
        }
    }
}

/// Whitespace-trimmed, interior-whitespace-collapsed subject identity
/// (spec §3 `Claim.subject`).
fn normalize_subject(subject: &str) -> String {
    subject.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wene_audit::ImmutableSinkSet;
    use wene_store::MemoryKvStore;
    use wene_types::{EventOwnerLink, ImmutableMode, OwnerSource};

    fn published_event(id: &str, interval_days: u32, max_per_interval: Option<u32>) -> Event {
        Event {
            id: id.to_string(),
            title: "Test Event".to_string(),
            datetime: "2026-01-01T00:00:00Z".to_string(),
            host: "host".to_string(),
            state: EventState::Published,
            solana_mint: None,
            solana_authority: None,
            solana_grant_id: None,
            ticket_token_amount: 1,
            claim_interval_days: interval_days,
            max_claims_per_interval: max_per_interval,
            risk_profile: None,
        }
    }

    async fn service(store: Arc<dyn wene_store::KvStore>) -> ClaimService {
        let events = EventRepo::new(store.clone());
        let claims = ClaimRepo::new(store.clone());
        let codes = ConfirmationCodeReservation::new(store.clone());
        let receipts = ReceiptStore::new(store.clone());
        let chain = Arc::new(AuditChain::new(
            store,
            ImmutableSinkSet::none(),
            ImmutableMode::Off,
            "wene",
        ));
        ClaimService::new(events, claims, codes, receipts, chain)
    }

    #[tokio::test]
    async fn idempotent_claim_does_not_advance_count() {
        let store: Arc<dyn wene_store::KvStore> = Arc::new(MemoryKvStore::new());
        let svc = service(store.clone()).await;
        svc.events
            .create(
                published_event("evt-1", 7, Some(1)),
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

        let (first, _) = svc
            .submit_claim(ClaimChannel::User, "evt-1", "alice", 0, "/verify")
            .await
            .unwrap();
        assert!(!first.already_joined);

        let (second, _) = svc
            .submit_claim(ClaimChannel::User, "evt-1", "alice", 1_000, "/verify")
            .await
            .unwrap();
        assert!(second.already_joined);
        assert_eq!(second.confirmation_code, first.confirmation_code);
    }

    /// Spec §8 scenario 8: claim_interval_days=7, max_claims_per_interval=2;
    /// three claims in a row => false, false, true.
    #[tokio::test]
    async fn rate_policy_allows_two_then_blocks_third() {
        let store: Arc<dyn wene_store::KvStore> = Arc::new(MemoryKvStore::new());
        let svc = service(store.clone()).await;
        svc.events
            .create(
                published_event("evt-1", 7, Some(2)),
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

        let day = 86_400_000_i64;
        let (r1, _) = svc
            .submit_claim(ClaimChannel::User, "evt-1", "alice", 0, "/verify")
            .await
            .unwrap();
        let (r2, _) = svc
            .submit_claim(ClaimChannel::User, "evt-1", "alice", day, "/verify")
            .await
            .unwrap();
        let (r3, _) = svc
            .submit_claim(ClaimChannel::User, "evt-1", "alice", 2 * day, "/verify")
            .await
            .unwrap();

        assert!(!r1.already_joined);
        assert!(!r2.already_joined);
        assert!(r3.already_joined);
    }

    #[tokio::test]
    async fn empty_subject_is_rejected_before_reserving_a_code() {
        let store: Arc<dyn wene_store::KvStore> = Arc::new(MemoryKvStore::new());
        let svc = service(store.clone()).await;
        svc.events
            .create(
                published_event("evt-1", 7, None),
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

        let err = svc
            .submit_claim(ClaimChannel::Wallet, "evt-1", "   ", 0, "/verify")
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiptError::WalletRequired));
    }
}
