//! Per-event admin authorization and `scope=mine` filtering (spec §4.G,
//! §3 `EventOwnerLink`).

use wene_store::EventRepo;
use wene_types::{AdminRole, Event};

use crate::error::{IdentityError, IdentityResult};

pub struct OwnershipGuard {
    events: EventRepo,
}

impl OwnershipGuard {
    pub fn new(events: EventRepo) -> Self {
        Self { events }
    }

    /// Master can access any event; an invited/demo operator only their own.
    pub async fn authorize(&self, caller: &AdminRole, event_id: &str) -> IdentityResult<()> {
        if caller.is_master() {
            return Ok(());
        }
        let owner = self.events.owner(event_id).await?.ok_or(IdentityError::NotOwner)?;
        match caller.admin_id() {
            Some(id) if id == owner.admin_id => Ok(()),
            _ => Err(IdentityError::NotOwner),
        }
    }

    /// Filters an event list for `GET /v1/school/events?scope=mine`.
    pub async fn filter_mine(&self, caller: &AdminRole, events: Vec<Event>) -> IdentityResult<Vec<Event>> {
        if caller.is_master() {
            return Ok(events);
        }
        let Some(caller_id) = caller.admin_id() else {
            return Ok(Vec::new());
        };
        let mut mine = Vec::new();
        for event in events {
            if let Some(owner) = self.events.owner(&event.id).await? {
                if owner.admin_id == caller_id {
                    mine.push(event);
                }
            }
        }
        Ok(mine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wene_store::MemoryKvStore;
    use wene_types::{EventOwnerLink, EventState, OwnerSource};

    fn event(id: &str) -> Event {
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

    #[tokio::test]
    async fn master_authorizes_against_any_event() {
        let events = EventRepo::new(Arc::new(MemoryKvStore::new()));
        let guard = OwnershipGuard::new(events);
        assert!(guard.authorize(&AdminRole::Master, "evt-1").await.is_ok());
    }

    #[tokio::test]
    async fn non_owner_is_rejected() {
        let store = Arc::new(MemoryKvStore::new());
        let events = EventRepo::new(store.clone());
        events
            .create(
                event("evt-1"),
                EventOwnerLink {
                    event_id: "evt-1".to_string(),
                    admin_id: "admin-owner".to_string(),
                    name: "Owner".to_string(),
                    source: OwnerSource::Invite,
                    linked_at: 0,
                },
            )
            .await
            .unwrap();
        let guard = OwnershipGuard::new(events);
        let other = AdminRole::Invited { admin_id: "admin-other".to_string() };
        assert!(matches!(guard.authorize(&other, "evt-1").await, Err(IdentityError::NotOwner)));
        let owner = AdminRole::Invited { admin_id: "admin-owner".to_string() };
        assert!(guard.authorize(&owner, "evt-1").await.is_ok());
    }

    #[tokio::test]
    async fn filter_mine_keeps_only_owned_events() {
        let store = Arc::new(MemoryKvStore::new());
        let events = EventRepo::new(store.clone());
        events
            .create(
                event("evt-mine"),
                EventOwnerLink {
                    event_id: "evt-mine".to_string(),
                    admin_id: "admin-1".to_string(),
                    name: "Me".to_string(),
                    source: OwnerSource::Invite,
                    linked_at: 0,
                },
            )
            .await
            .unwrap();
        events
            .create(
                event("evt-other"),
                EventOwnerLink {
                    event_id: "evt-other".to_string(),
                    admin_id: "admin-2".to_string(),
                    name: "Other".to_string(),
                    source: OwnerSource::Invite,
                    linked_at: 0,
                },
            )
            .await
            .unwrap();
        let guard = OwnershipGuard::new(events);
        let caller = AdminRole::Invited { admin_id: "admin-1".to_string() };
        let all = vec![event("evt-mine"), event("evt-other")];
        let mine = guard.filter_mine(&caller, all).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "evt-mine");
    }
}
