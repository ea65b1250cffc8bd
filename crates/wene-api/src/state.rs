//! Shared application state: every service the handlers and dispatcher
//! middleware need, built once at startup.

use std::sync::Arc;

use wene_audit::AuditChain;
use wene_identity::{IdentityConfig, IdentityService, InviteService, OwnershipGuard};
use wene_pop::PopService;
use wene_receipts::{ClaimService, ReceiptStore, UserRegistry};
use wene_search::SearchService;
use wene_store::{AdminCodeRepo, ClaimRepo, EventRepo};

#[derive(Clone)]
pub struct AppState {
    pub audit: Arc<AuditChain>,
    pub events: EventRepo,
    pub claims_repo: ClaimRepo,
    pub claims: Arc<ClaimService>,
    pub receipts: Arc<ReceiptStore>,
    pub users: Arc<UserRegistry>,
    pub pop: Arc<PopService>,
    pub identity: Arc<IdentityService>,
    pub invites: Arc<InviteService>,
    pub ownership: Arc<OwnershipGuard>,
    pub search: Arc<SearchService>,
    pub admin_codes: AdminCodeRepo,
    pub cors_origin: Option<String>,
}

/// Everything [`AppState`] needs, already constructed by the caller
/// (typically `services/wene-server`'s startup code).
pub struct AppStateDeps {
    pub audit: Arc<AuditChain>,
    pub events: EventRepo,
    pub claims_repo: ClaimRepo,
    pub claims: ClaimService,
    pub receipts: ReceiptStore,
    pub users: UserRegistry,
    pub pop: PopService,
    pub identity_config: IdentityConfig,
    pub admin_codes: AdminCodeRepo,
    pub search: SearchService,
    pub cors_origin: Option<String>,
}

impl AppState {
    pub fn new(deps: AppStateDeps) -> Self {
        let identity = IdentityService::new(deps.identity_config, deps.admin_codes.clone());
        let invites = InviteService::new(deps.admin_codes.clone());
        let ownership = OwnershipGuard::new(deps.events.clone());
        Self {
            audit: deps.audit,
            events: deps.events,
            claims_repo: deps.claims_repo,
            claims: Arc::new(deps.claims),
            receipts: Arc::new(deps.receipts),
            users: Arc::new(deps.users),
            pop: Arc::new(deps.pop),
            identity: Arc::new(identity),
            invites: Arc::new(invites),
            ownership: Arc::new(ownership),
            search: Arc::new(deps.search),
            admin_codes: deps.admin_codes,
            cors_origin: deps.cors_origin,
        }
    }
}
