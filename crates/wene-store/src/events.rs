//! Event CRUD and ownership links (spec §4.D, §4.G "event ownership").

use std::sync::Arc;

use wene_types::{Event, EventOwnerLink, EventState, OwnerSource};

use crate::error::StoreResult;
use crate::kv::{get_json, list_prefix_json, put_json, KvStore};

const EVENT_PREFIX: &str = "event:";
const EVENT_OWNER_PREFIX: &str = "event_owner:";

#[derive(Clone)]
pub struct EventRepo {
    store: Arc<dyn KvStore>,
}

impl EventRepo {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn key(event_id: &str) -> String {
        format!("{EVENT_PREFIX}{event_id}")
    }

    fn owner_key(event_id: &str) -> String {
        format!("{EVENT_OWNER_PREFIX}{event_id}")
    }

    pub async fn get(&self, event_id: &str) -> StoreResult<Option<Event>> {
        if let Some(event) = get_json(self.store.as_ref(), &Self::key(event_id)).await? {
            return Ok(Some(event));
        }
        Ok(seed_events().into_iter().find(|e| e.id == event_id))
    }

    /// Every stored event merged with the seed demo list, stored entries
    /// winning on id collision, as spec.md's "the seed list merges with
    /// stored events" (§4.D).
    pub async fn list(&self) -> StoreResult<Vec<Event>> {
        let stored: Vec<(String, Event)> =
            list_prefix_json(self.store.as_ref(), EVENT_PREFIX, None, false).await?;
        let mut merged: Vec<Event> = stored.into_iter().map(|(_, e)| e).collect();
        let stored_ids: std::collections::HashSet<&str> =
            merged.iter().map(|e| e.id.as_str()).collect();
        for seed in seed_events() {
            if !stored_ids.contains(seed.id.as_str()) {
                merged.push(seed);
            }
        }
        Ok(merged)
    }

    /// `true` if an existing event already claims the same on-chain triple.
    pub async fn triple_in_use(&self, triple: (&str, &str, &str)) -> StoreResult<bool> {
        for event in self.list().await? {
            if event.onchain_triple() == Some(triple) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn create(&self, event: Event, owner: EventOwnerLink) -> StoreResult<()> {
        put_json(self.store.as_ref(), &Self::key(&event.id), &event).await?;
        put_json(self.store.as_ref(), &Self::owner_key(&event.id), &owner).await
    }

    pub async fn owner(&self, event_id: &str) -> StoreResult<Option<EventOwnerLink>> {
        get_json(self.store.as_ref(), &Self::owner_key(event_id)).await
    }
}

/// Demo events merged into every listing, stored-wins on id collision.
pub fn seed_events() -> Vec<Event> {
    vec![Event {
        id: "demo-welcome-mixer".to_string(),
        title: "Welcome Mixer".to_string(),
        datetime: "2026-01-15T18:00:00Z".to_string(),
        host: "WeNe Community".to_string(),
        state: EventState::Published,
        solana_mint: None,
        solana_authority: None,
        solana_grant_id: None,
        ticket_token_amount: 1,
        claim_interval_days: 7,
        max_claims_per_interval: Some(1),
        risk_profile: None,
    }]
}

pub fn seed_owner(event_id: &str) -> EventOwnerLink {
    EventOwnerLink {
        event_id: event_id.to_string(),
        admin_id: "seed".to_string(),
        name: "WeNe Community".to_string(),
        source: OwnerSource::Master,
        linked_at: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    #[tokio::test]
    async fn seed_event_is_visible_without_being_stored() {
        let repo = EventRepo::new(Arc::new(MemoryKvStore::new()));
        let event = repo.get("demo-welcome-mixer").await.unwrap();
        assert!(event.is_some());
    }

    #[tokio::test]
    async fn stored_event_shadows_seed_on_id_collision() {
        let repo = EventRepo::new(Arc::new(MemoryKvStore::new()));
        let mut overridden = seed_events().remove(0);
        overridden.title = "Renamed".to_string();
        repo.create(overridden.clone(), seed_owner(&overridden.id))
            .await
            .unwrap();
        let list = repo.list().await.unwrap();
        let matched: Vec<_> = list.iter().filter(|e| e.id == overridden.id).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].title, "Renamed");
    }
}
