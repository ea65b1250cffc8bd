//! Admin invite storage (spec §3 `AdminCodeRecord`, §4.G).

use std::sync::Arc;

use wene_types::AdminCodeRecord;

use crate::error::StoreResult;
use crate::kv::{get_json, list_prefix_json, put_json, KvStore};

const PREFIX: &str = "admin_code:";

fn key(token: &str) -> String {
    format!("{PREFIX}{token}")
}

#[derive(Clone)]
pub struct AdminCodeRepo {
    store: Arc<dyn KvStore>,
}

impl AdminCodeRepo {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, token: &str) -> StoreResult<Option<AdminCodeRecord>> {
        get_json(self.store.as_ref(), &key(token)).await
    }

    pub async fn put(&self, token: &str, record: &AdminCodeRecord) -> StoreResult<()> {
        put_json(self.store.as_ref(), &key(token), record).await
    }

    /// Every issued invite, token paired with its record, for disclosure
    /// (spec §4.H).
    pub async fn list(&self) -> StoreResult<Vec<(String, AdminCodeRecord)>> {
        let rows: Vec<(String, AdminCodeRecord)> = list_prefix_json(self.store.as_ref(), PREFIX, None, false).await?;
        Ok(rows
            .into_iter()
            .map(|(k, record)| (k.trim_start_matches(PREFIX).to_string(), record))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    #[tokio::test]
    async fn stores_and_reads_back() {
        let repo = AdminCodeRepo::new(Arc::new(MemoryKvStore::new()));
        let record = AdminCodeRecord {
            admin_id: "admin-1".to_string(),
            name: "Alice".to_string(),
            source: "invite".to_string(),
            created_at: 0,
            revoked_at: None,
            revoked_by: None,
        };
        repo.put("tok123", &record).await.unwrap();
        let loaded = repo.get("tok123").await.unwrap().unwrap();
        assert_eq!(loaded.admin_id, "admin-1");
        assert!(!loaded.is_revoked());
    }

    #[tokio::test]
    async fn list_returns_token_alongside_record() {
        let repo = AdminCodeRepo::new(Arc::new(MemoryKvStore::new()));
        let record = AdminCodeRecord {
            admin_id: "admin-1".to_string(),
            name: "Alice".to_string(),
            source: "invite".to_string(),
            created_at: 0,
            revoked_at: None,
            revoked_by: None,
        };
        repo.put("tok123", &record).await.unwrap();
        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "tok123");
        assert_eq!(all[0].1.admin_id, "admin-1");
    }
}
