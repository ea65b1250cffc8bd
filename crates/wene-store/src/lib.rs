//! WeNe store — the storage contract and repositories the participation
//! ledger is built over (SPEC_FULL.md §5, spec.md §6 persisted namespaces).
//!
//! # Architecture
//!
//! `Store` holds one `Arc<dyn KvStore>` and hands out repository instances
//! over it, mirroring the teacher's `Database` connection-pool-plus-repo-
//! factory pattern — `KvStore` stands in for `PgPool`. [`MemoryKvStore`] is
//! the one concrete implementation shipped in-core; a real deployment
//! supplies its own (object-store or Cloudflare KV adapter) as an external
//! collaborator.
//!
//! # Repository pattern
//!
//! Each domain (events, claims, users, admin invites) has its own
//! repository doing typed CRUD over the shared KV contract.

pub mod admin;
pub mod claims;
pub mod error;
pub mod events;
pub mod kv;
pub mod users;

use std::sync::Arc;

pub use admin::AdminCodeRepo;
pub use claims::ClaimRepo;
pub use error::{StoreError, StoreResult};
pub use events::{seed_events, seed_owner, EventRepo};
pub use kv::{get_json, list_prefix_json, put_json, put_json_if_absent, KvStore, MemoryKvStore};
pub use users::UserRepo;

/// Repository factory over a shared `KvStore` handle.
#[derive(Clone)]
pub struct Store {
    kv: Arc<dyn KvStore>,
}

impl Store {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryKvStore::shared())
    }

    pub fn kv(&self) -> Arc<dyn KvStore> {
        self.kv.clone()
    }

    pub fn events(&self) -> EventRepo {
        EventRepo::new(self.kv.clone())
    }

    pub fn claims(&self) -> ClaimRepo {
        ClaimRepo::new(self.kv.clone())
    }

    pub fn users(&self) -> UserRepo {
        UserRepo::new(self.kv.clone())
    }

    pub fn admin_codes(&self) -> AdminCodeRepo {
        AdminCodeRepo::new(self.kv.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_hands_out_independent_repo_views_over_one_backend() {
        let store = Store::in_memory();
        let events = store.events();
        let owner = seed_owner("evt-x");
        let mut event = seed_events().remove(0);
        event.id = "evt-x".to_string();
        events.create(event, owner).await.unwrap();
        assert!(store.events().get("evt-x").await.unwrap().is_some());
    }
}
