//! In-process, 30-second-TTL search index cache (spec §4.H): the fallback
//! path used whenever no SQL storage capability is present. Keyed the same
//! way the (unimplemented, see DESIGN.md) SQL-backed path would be:
//! `globalAuditHead|includeRevoked|transferLimit`.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use wene_types::constants::SEARCH_CACHE_TTL_SECS;

use crate::index::SearchIndex;

pub fn index_key(global_audit_head: &str, include_revoked: bool, transfer_limit: usize) -> String {
    format!("{global_audit_head}|{include_revoked}|{transfer_limit}")
}

struct CacheEntry {
    key: String,
    built_at: Instant,
    index: Arc<SearchIndex>,
}

/// Single-slot cache: the index key already encodes everything the query
/// shape depends on, so a cache hit is "same key, not yet expired".
pub struct SearchIndexCache {
    slot: Mutex<Option<CacheEntry>>,
}

impl Default for SearchIndexCache {
    fn default() -> Self {
        Self { slot: Mutex::new(None) }
    }
}

impl SearchIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached index for `key` if still fresh, rebuilding via
    /// `build` otherwise.
    pub async fn get_or_build<F>(&self, key: &str, build: F) -> Arc<SearchIndex>
    where
        F: FnOnce() -> SearchIndex,
    {
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if entry.key == key && entry.built_at.elapsed().as_secs() < SEARCH_CACHE_TTL_SECS {
                return entry.index.clone();
            }
        }
        let index = Arc::new(build());
        *slot = Some(CacheEntry { key: key.to_string(), built_at: Instant::now(), index: index.clone() });
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchDoc;

    fn empty_index() -> SearchIndex {
        SearchIndex::build(Vec::<SearchDoc>::new())
    }

    #[tokio::test]
    async fn same_key_reuses_cached_index() {
        let cache = SearchIndexCache::new();
        let mut builds = 0;
        let _first = cache
            .get_or_build("k1", || {
                builds += 1;
                empty_index()
            })
            .await;
        let _second = cache
            .get_or_build("k1", || {
                builds += 1;
                empty_index()
            })
            .await;
        assert_eq!(builds, 1);
    }

    #[tokio::test]
    async fn different_key_rebuilds() {
        let cache = SearchIndexCache::new();
        let mut builds = 0;
        let _first = cache
            .get_or_build("k1", || {
                builds += 1;
                empty_index()
            })
            .await;
        let _second = cache
            .get_or_build("k2", || {
                builds += 1;
                empty_index()
            })
            .await;
        assert_eq!(builds, 2);
    }
}
