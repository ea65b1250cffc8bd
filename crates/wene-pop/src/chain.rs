//! Per-grant PoP double hash chain storage (spec §3 `PopChainEntry`, §4.F
//! steps 2 and 5).

use std::sync::Arc;

use wene_store::{put_json, KvStore};
use wene_types::{constants::GENESIS, PopChainEntry};

use crate::error::PopResult;

fn global_last_hash_key(grant_b58: &str) -> String {
    format!("pop_chain:lastHash:global:{grant_b58}")
}

fn stream_last_hash_key(grant_b58: &str) -> String {
    format!("pop_chain:lastHash:stream:{grant_b58}")
}

fn history_key(iso: &str, entry_hash: &str) -> String {
    format!("pop_chain:history:{iso}:{entry_hash}")
}

pub struct PopChainStore {
    store: Arc<dyn KvStore>,
}

impl PopChainStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    async fn last_hash(&self, key: &str) -> PopResult<String> {
        Ok(match self.store.get(key).await? {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => GENESIS.to_string(),
        })
    }

    /// `"GENESIS"` decodes to 32 zero bytes for the signable message, per
    /// spec §4.F step 2.
    pub async fn global_last_hash(&self, grant_b58: &str) -> PopResult<String> {
        self.last_hash(&global_last_hash_key(grant_b58)).await
    }

    pub async fn stream_last_hash(&self, grant_b58: &str) -> PopResult<String> {
        self.last_hash(&stream_last_hash_key(grant_b58)).await
    }

    /// Advances both pointers to `entry.entry_hash` and persists the full
    /// history record, atomically from the caller's perspective (both
    /// writes happen under the PoP lock held by [`crate::service`]).
    pub async fn advance(&self, grant_b58: &str, iso: &str, entry: &PopChainEntry) -> PopResult<()> {
        self.store
            .put(
                &global_last_hash_key(grant_b58),
                entry.entry_hash.clone().into_bytes(),
            )
            .await?;
        self.store
            .put(
                &stream_last_hash_key(grant_b58),
                entry.entry_hash.clone().into_bytes(),
            )
            .await?;
        put_json(self.store.as_ref(), &history_key(iso, &entry.entry_hash), entry).await?;
        Ok(())
    }
}

/// Decode a lastHash pointer into its 32-byte form: `"GENESIS"` is all
/// zero bytes, anything else is 64-hex.
pub fn decode_last_hash(raw: &str) -> PopResult<[u8; 32]> {
    if raw == GENESIS {
        return Ok([0u8; 32]);
    }
    let bytes = hex::decode(raw)
        .map_err(|e| crate::error::PopError::InvalidInput(format!("malformed chain hash: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| crate::error::PopError::InvalidInput("chain hash must be 32 bytes".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wene_store::MemoryKvStore;

    #[tokio::test]
    async fn genesis_is_the_initial_last_hash() {
        let chain = PopChainStore::new(Arc::new(MemoryKvStore::new()));
        assert_eq!(chain.global_last_hash("grant1").await.unwrap(), GENESIS);
        assert_eq!(decode_last_hash(GENESIS).unwrap(), [0u8; 32]);
    }

    #[tokio::test]
    async fn advance_updates_both_pointers() {
        let chain = PopChainStore::new(Arc::new(MemoryKvStore::new()));
        let entry = PopChainEntry {
            grant: "grant1".to_string(),
            claimer: "claimer1".to_string(),
            period_index: 0,
            prev_hash: GENESIS.to_string(),
            stream_prev_hash: GENESIS.to_string(),
            audit_hash: "a".repeat(64),
            entry_hash: "b".repeat(64),
            issued_at: 0,
        };
        chain.advance("grant1", "2026-01-01T00:00:00Z", &entry).await.unwrap();
        assert_eq!(chain.global_last_hash("grant1").await.unwrap(), "b".repeat(64));
        assert_eq!(chain.stream_last_hash("grant1").await.unwrap(), "b".repeat(64));
    }
}
