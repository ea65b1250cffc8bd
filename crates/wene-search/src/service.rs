//! Ties the disclosure graph, document model, and TTL cache into one
//! master-only search surface (spec §4.H).

use std::sync::Arc;

use wene_audit::AuditChain;
use wene_store::{AdminCodeRepo, EventRepo};
use wene_types::AdminRole;

use crate::cache::{index_key, SearchIndexCache};
use crate::disclosure::{build_disclosure, AdminDisclosure};
use crate::error::{SearchError, SearchResult};
use crate::index::{build_documents, SearchDoc};

pub struct SearchService {
    admins: AdminCodeRepo,
    events: EventRepo,
    audit: Arc<AuditChain>,
    cache: SearchIndexCache,
}

impl SearchService {
    pub fn new(admins: AdminCodeRepo, events: EventRepo, audit: Arc<AuditChain>) -> Self {
        Self { admins, events, audit, cache: SearchIndexCache::new() }
    }

    /// Self-service disclosure view for `/api/admin/transfers`: an invited
    /// or demo operator sees only their own disclosure record, PII stripped
    /// on every related transfer; master sees every record, still redacted
    /// (unredacted access stays behind `/api/master/admin-disclosures`).
    pub async fn disclosure_for_admin(&self, caller: &AdminRole, include_revoked: bool, transfer_window: usize) -> SearchResult<Vec<AdminDisclosure>> {
        let mut records = build_disclosure(&self.admins, &self.events, &self.audit, include_revoked, transfer_window).await?;
        if !caller.is_master() {
            let Some(caller_id) = caller.admin_id() else {
                return Ok(Vec::new());
            };
            records.retain(|record| record.admin_id == caller_id);
        }
        for record in &mut records {
            for related in &mut record.related_users {
                related.transfers = related.transfers.iter().map(|t| t.redacted()).collect();
            }
        }
        Ok(records)
    }

    /// Master-role disclosure view (PII intact).
    pub async fn disclosure_for_master(&self, caller: &AdminRole, include_revoked: bool, transfer_window: usize) -> SearchResult<Vec<AdminDisclosure>> {
        require_master(caller)?;
        build_disclosure(&self.admins, &self.events, &self.audit, include_revoked, transfer_window).await
    }

    pub async fn search(
        &self,
        caller: &AdminRole,
        query: &str,
        include_revoked: bool,
        transfer_window: usize,
        limit: usize,
    ) -> SearchResult<Vec<(SearchDoc, i64)>> {
        require_master(caller)?;
        let head = self.audit.global_head().await?;
        let key = index_key(&head, include_revoked, transfer_window);
        let disclosures = build_disclosure(&self.admins, &self.events, &self.audit, include_revoked, transfer_window).await?;
        let index = self
            .cache
            .get_or_build(&key, || crate::index::SearchIndex::build(build_documents(&disclosures)))
            .await;
        Ok(index.search(query, limit))
    }
}

fn require_master(caller: &AdminRole) -> SearchResult<()> {
    if caller.is_master() {
        Ok(())
    } else {
        Err(SearchError::MasterRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wene_audit::ImmutableSinkSet;
    use wene_store::MemoryKvStore;
    use wene_types::{AdminCodeRecord, Event, EventOwnerLink, EventState, ImmutableMode, OwnerSource};

    fn event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            title: "Welcome Mixer".to_string(),
            datetime: "2026-01-15T18:00:00Z".to_string(),
            host: "WeNe Community".to_string(),
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

    #[tokio::test]
    async fn non_master_search_is_rejected() {
        let store = Arc::new(MemoryKvStore::new());
        let svc = SearchService::new(
            AdminCodeRepo::new(store.clone()),
            EventRepo::new(store.clone()),
            Arc::new(AuditChain::new(store.clone(), ImmutableSinkSet::none(), ImmutableMode::Off, "wene")),
        );
        let caller = AdminRole::Invited { admin_id: "x".to_string() };
        assert!(matches!(svc.search(&caller, "anything", false, 50, 10).await, Err(SearchError::MasterRequired)));
    }

    #[tokio::test]
    async fn master_finds_owned_event_by_title() {
        let store = Arc::new(MemoryKvStore::new());
        let events = EventRepo::new(store.clone());
        events
            .create(
                event("evt-1"),
                EventOwnerLink {
                    event_id: "evt-1".to_string(),
                    admin_id: "admin-1".to_string(),
                    name: "Alice".to_string(),
                    source: OwnerSource::Invite,
                    linked_at: 0,
                },
            )
            .await
            .unwrap();
        let admins = AdminCodeRepo::new(store.clone());
        admins
            .put(
                "tok1",
                &AdminCodeRecord {
                    admin_id: "admin-1".to_string(),
                    name: "Alice".to_string(),
                    source: "invite".to_string(),
                    created_at: 0,
                    revoked_at: None,
                    revoked_by: None,
                },
            )
            .await
            .unwrap();
        let svc = SearchService::new(
            admins,
            events,
            Arc::new(AuditChain::new(store.clone(), ImmutableSinkSet::none(), ImmutableMode::Off, "wene")),
        );
        let results = svc.search(&AdminRole::Master, "welcome mixer", false, 50, 10).await.unwrap();
        assert!(results.iter().any(|(doc, _)| doc.id == "event:evt-1"));
    }
}
