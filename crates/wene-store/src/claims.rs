//! Claim storage: append, list-by-subject, claimant listing (spec §4.D).

use std::sync::Arc;

use wene_types::Claim;

use crate::error::StoreResult;
use crate::kv::{get_json, list_prefix_json, put_json, KvStore};

fn key(event_id: &str, subject: &str) -> String {
    format!("claim:{event_id}:{subject}")
}

#[derive(Clone)]
pub struct ClaimRepo {
    store: Arc<dyn KvStore>,
}

impl ClaimRepo {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// All claims recorded for `(event_id, subject)`, oldest first. A
    /// subject may have multiple claims within the rate window; each
    /// append adds, it never overwrites.
    pub async fn for_subject(&self, event_id: &str, subject: &str) -> StoreResult<Vec<Claim>> {
        let mut claims: Vec<Claim> = get_json(self.store.as_ref(), &key(event_id, subject))
            .await?
            .unwrap_or_default();
        claims.sort_by_key(|c| c.claimed_at);
        Ok(claims)
    }

    pub async fn has_claimed(&self, event_id: &str, subject: &str) -> StoreResult<bool> {
        Ok(!self.for_subject(event_id, subject).await?.is_empty())
    }

    /// Appends a claim to `(event_id, subject)`'s history.
    pub async fn record(&self, claim: &Claim) -> StoreResult<()> {
        let mut claims = self.for_subject(&claim.event_id, &claim.subject).await?;
        claims.push(claim.clone());
        put_json(
            self.store.as_ref(),
            &key(&claim.event_id, &claim.subject),
            &claims,
        )
        .await
    }

    /// The most recent claim for `(event_id, subject)`, if any.
    pub async fn get(&self, event_id: &str, subject: &str) -> StoreResult<Option<Claim>> {
        Ok(self.for_subject(event_id, subject).await?.into_iter().last())
    }

    pub async fn set_latest_confirmation_code(
        &self,
        event_id: &str,
        subject: &str,
        code: &str,
    ) -> StoreResult<()> {
        let mut claims = self.for_subject(event_id, subject).await?;
        if let Some(last) = claims.last_mut() {
            last.confirmation_code = Some(code.to_string());
            put_json(self.store.as_ref(), &key(event_id, subject), &claims).await?;
        }
        Ok(())
    }

    /// One entry per claimant (their first claim), ascending by
    /// `claimed_at` (spec §4.D).
    pub async fn claimants(&self, event_id: &str) -> StoreResult<Vec<Claim>> {
        let prefix = format!("claim:{event_id}:");
        let rows: Vec<(String, Vec<Claim>)> =
            list_prefix_json(self.store.as_ref(), &prefix, None, false).await?;
        let mut claims: Vec<Claim> = rows
            .into_iter()
            .filter_map(|(_, mut history)| {
                history.sort_by_key(|c| c.claimed_at);
                history.into_iter().next()
            })
            .collect();
        claims.sort_by_key(|c| c.claimed_at);
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    fn claim(event_id: &str, subject: &str, at: i64) -> Claim {
        Claim {
            event_id: event_id.to_string(),
            subject: subject.to_string(),
            claimed_at: at,
            confirmation_code: None,
        }
    }

    #[tokio::test]
    async fn records_and_retrieves_by_subject() {
        let repo = ClaimRepo::new(Arc::new(MemoryKvStore::new()));
        repo.record(&claim("evt-1", "alice", 100)).await.unwrap();
        assert!(repo.has_claimed("evt-1", "alice").await.unwrap());
        assert!(!repo.has_claimed("evt-1", "bob").await.unwrap());
    }

    #[tokio::test]
    async fn claimants_sorted_ascending_by_claimed_at() {
        let repo = ClaimRepo::new(Arc::new(MemoryKvStore::new()));
        repo.record(&claim("evt-1", "bob", 200)).await.unwrap();
        repo.record(&claim("evt-1", "alice", 100)).await.unwrap();
        let claimants = repo.claimants("evt-1").await.unwrap();
        assert_eq!(
            claimants.iter().map(|c| c.subject.as_str()).collect::<Vec<_>>(),
            vec!["alice", "bob"]
        );
    }
}
