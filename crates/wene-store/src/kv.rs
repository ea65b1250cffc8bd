//! The storage contract every repository in this crate is built over
//! (SPEC_FULL.md §5). Spec.md treats the underlying store as an external,
//! linearizable, persistent KV with optional SQL (§1 Non-goals); this trait
//! is the narrow capability the core actually needs, and [`MemoryKvStore`]
//! is the one production-shaped implementation that ships in-core so the
//! workspace is runnable without a concrete cloud binding.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;
    /// Put only if the key is absent. Returns `true` if the write happened.
    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> StoreResult<bool>;
    async fn delete(&self, key: &str) -> StoreResult<()>;
    /// List entries whose key starts with `prefix`, ordered by key
    /// (ascending, unless `reverse`), optionally capped at `limit`.
    async fn list_prefix(
        &self,
        prefix: &str,
        limit: Option<usize>,
        reverse: bool,
    ) -> StoreResult<Vec<(String, Vec<u8>)>>;
}

/// In-process `KvStore` backed by a `BTreeMap`, chosen over a `HashMap`
/// because the ordered prefix scans spec.md's `audit_history:` listing and
/// lastHash lookups need come for free from the map's own ordering.
#[derive(Default)]
pub struct MemoryKvStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn KvStore> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> StoreResult<bool> {
        let mut guard = self.data.write().await;
        if guard.contains_key(key) {
            return Ok(false);
        }
        guard.insert(key.to_string(), value);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn list_prefix(
        &self,
        prefix: &str,
        limit: Option<usize>,
        reverse: bool,
    ) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let guard = self.data.read().await;
        let upper = prefix_upper_bound(prefix);
        let range = guard.range((Bound::Included(prefix.to_string()), upper));
        let mut items: Vec<(String, Vec<u8>)> = range.map(|(k, v)| (k.clone(), v.clone())).collect();
        if reverse {
            items.reverse();
        }
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}

/// Exclusive upper bound for a lexicographic prefix scan: the prefix with
/// its last byte incremented, or unbounded if the prefix is all `0xff`.
fn prefix_upper_bound(prefix: &str) -> Bound<String> {
    let mut bytes = prefix.as_bytes().to_vec();
    while let Some(&last) = bytes.last() {
        if last == 0xff {
            bytes.pop();
            continue;
        }
        *bytes.last_mut().unwrap() += 1;
        return Bound::Excluded(String::from_utf8(bytes).expect("prefix mutation stays valid utf8"));
    }
    Bound::Unbounded
}

/// Typed convenience helpers layered over the raw byte contract; every
/// repository in this crate goes through these instead of hand-rolling
/// `serde_json` calls at each call site.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub async fn put_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    store.put(key, serde_json::to_vec(value)?).await
}

pub async fn put_json_if_absent<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> StoreResult<bool> {
    store.put_if_absent(key, serde_json::to_vec(value)?).await
}

pub async fn list_prefix_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    prefix: &str,
    limit: Option<usize>,
    reverse: bool,
) -> StoreResult<Vec<(String, T)>> {
    let raw = store.list_prefix(prefix, limit, reverse).await?;
    raw.into_iter()
        .map(|(k, v)| {
            serde_json::from_slice(&v)
                .map(|value| (k, value))
                .map_err(StoreError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_if_absent_rejects_existing_key() {
        let store = MemoryKvStore::new();
        assert!(store.put_if_absent("a", b"1".to_vec()).await.unwrap());
        assert!(!store.put_if_absent("a", b"2".to_vec()).await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn list_prefix_is_ordered_and_scoped() {
        let store = MemoryKvStore::new();
        for key in ["event:a", "event:b", "event:c", "claim:a"] {
            store.put(key, key.as_bytes().to_vec()).await.unwrap();
        }
        let listed = store.list_prefix("event:", None, false).await.unwrap();
        let keys: Vec<_> = listed.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["event:a", "event:b", "event:c"]);
    }

    #[tokio::test]
    async fn list_prefix_reverse_and_limit() {
        let store = MemoryKvStore::new();
        for key in ["audit_history:1", "audit_history:2", "audit_history:3"] {
            store.put(key, vec![]).await.unwrap();
        }
        let listed = store
            .list_prefix("audit_history:", Some(2), true)
            .await
            .unwrap();
        let keys: Vec<_> = listed.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["audit_history:3", "audit_history:2"]);
    }
}
