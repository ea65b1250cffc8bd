//! Shared `AppState` builder for this crate's unit tests: every domain
//! service wired over one in-memory store, audit durability off, PoP
//! signing unconfigured — the minimal state the dispatcher and readiness
//! checks need to exercise their unconfigured/fail-closed paths.

#![cfg(test)]

use std::sync::Arc;

use wene_audit::{AuditChain, ImmutableSinkSet};
use wene_identity::IdentityConfig;
use wene_pop::chain::PopChainStore;
use wene_pop::config::{PopSigner, PopSignerConfig};
use wene_pop::PopService;
use wene_receipts::codes::ConfirmationCodeReservation;
use wene_receipts::{ClaimService, ReceiptStore, UserRegistry};
use wene_search::SearchService;
use wene_store::{AdminCodeRepo, ClaimRepo, EventRepo, MemoryKvStore};
use wene_types::ImmutableMode;

use crate::state::{AppState, AppStateDeps};

pub fn test_state() -> AppState {
    let store = MemoryKvStore::shared();
    let audit = Arc::new(AuditChain::new(store.clone(), ImmutableSinkSet::none(), ImmutableMode::Off, "wene"));
    let events = EventRepo::new(store.clone());
    let claims_repo = ClaimRepo::new(store.clone());
    let admin_codes = AdminCodeRepo::new(store.clone());
    let signer_config = PopSignerConfig { secret_key_b64: None, pubkey_b58: None, enforce_onchain_pop: false };
    AppState::new(AppStateDeps {
        audit: audit.clone(),
        events: events.clone(),
        claims_repo: claims_repo.clone(),
        claims: ClaimService::new(
            events.clone(),
            claims_repo.clone(),
            ConfirmationCodeReservation::new(store.clone()),
            ReceiptStore::new(store.clone()),
            audit.clone(),
        ),
        receipts: ReceiptStore::new(store.clone()),
        users: UserRegistry::new(store.clone()),
        pop: PopService::new(events.clone(), PopChainStore::new(store.clone()), audit.clone(), PopSigner::new(signer_config)),
        identity_config: IdentityConfig::new(None, None),
        admin_codes: admin_codes.clone(),
        search: SearchService::new(admin_codes, events, audit),
        cors_origin: None,
    })
}
