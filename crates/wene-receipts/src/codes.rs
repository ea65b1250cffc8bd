//! Confirmation-code reservation (spec §4.E), serialized under a dedicated
//! lock distinct from the audit lock (spec §5 `confirmationCodeLock`).

use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use wene_store::{get_json, list_prefix_json, put_json_if_absent, KvStore};
use wene_types::constants::{CONFIRMATION_CODE_ALPHABET, CONFIRMATION_CODE_LEN, CONFIRMATION_CODE_MAX_DRAWS};

use crate::error::{ReceiptError, ReceiptResult};

/// Bound on the legacy-receipt-key scan used to seed the used-code set.
const LEGACY_SCAN_LIMIT: usize = 500;

fn index_key(code: &str) -> String {
    format!("confirmation_code_index:{code}")
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConfirmationCodeIndexEntry {
    pub code: String,
    pub event_id: String,
    pub subject: String,
    pub issued_at: i64,
}

/// Produces candidate codes; the default draws uniformly from the
/// confirmation-code alphabet, a test double can replay a fixed sequence
/// (spec §8 scenario 7).
pub trait CodeGenerator: Send + Sync {
    fn next_code(&self) -> String;
}

pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn next_code(&self) -> String {
        let alphabet: Vec<char> = CONFIRMATION_CODE_ALPHABET.chars().collect();
        let mut rng = rand::thread_rng();
        (0..CONFIRMATION_CODE_LEN)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect()
    }
}

pub struct ConfirmationCodeReservation {
    store: Arc<dyn KvStore>,
    generator: Arc<dyn CodeGenerator>,
    lock: Mutex<()>,
}

impl ConfirmationCodeReservation {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_generator(store, Arc::new(RandomCodeGenerator))
    }

    pub fn with_generator(store: Arc<dyn KvStore>, generator: Arc<dyn CodeGenerator>) -> Self {
        Self {
            store,
            generator,
            lock: Mutex::new(()),
        }
    }

    async fn already_used_legacy(&self) -> ReceiptResult<std::collections::HashSet<String>> {
        let rows: Vec<(String, serde_json::Value)> = list_prefix_json(
            self.store.as_ref(),
            "ticket_receipt:",
            Some(LEGACY_SCAN_LIMIT),
            false,
        )
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(key, _)| key.rsplit(':').next().map(|s| s.to_string()))
            .collect())
    }

    /// Draw up to [`CONFIRMATION_CODE_MAX_DRAWS`] candidates, reject any
    /// already indexed or present in the legacy-key set, persist the
    /// winner's index entry.
    pub async fn reserve(&self, event_id: &str, subject: &str, issued_at: i64) -> ReceiptResult<String> {
        let _guard = self.lock.lock().await;
        let legacy_used = self.already_used_legacy().await?;

        for _ in 0..CONFIRMATION_CODE_MAX_DRAWS {
            let candidate = self.generator.next_code();
            if legacy_used.contains(&candidate) {
                continue;
            }
            let entry = ConfirmationCodeIndexEntry {
                code: candidate.clone(),
                event_id: event_id.to_string(),
                subject: subject.to_string(),
                issued_at,
            };
            if put_json_if_absent(self.store.as_ref(), &index_key(&candidate), &entry).await? {
                return Ok(candidate);
            }
        }
        Err(ReceiptError::ConfirmationCodeExhausted)
    }

    /// Delete the index entry only if it still maps to `(event_id, subject)`.
    pub async fn release(&self, code: &str, event_id: &str, subject: &str) -> ReceiptResult<()> {
        let _guard = self.lock.lock().await;
        if let Some(entry) = self.indexed(code).await? {
            if entry.event_id == event_id && entry.subject == subject {
                self.store.delete(&index_key(code)).await?;
            }
        }
        Ok(())
    }

    pub async fn indexed(&self, code: &str) -> ReceiptResult<Option<ConfirmationCodeIndexEntry>> {
        Ok(get_json(self.store.as_ref(), &index_key(code)).await?)
    }

    /// Idempotent: persists the index entry if absent, leaves it untouched
    /// otherwise.
    pub async fn ensure_indexed(&self, event_id: &str, subject: &str, code: &str, issued_at: i64) -> ReceiptResult<()> {
        let _guard = self.lock.lock().await;
        let entry = ConfirmationCodeIndexEntry {
            code: code.to_string(),
            event_id: event_id.to_string(),
            subject: subject.to_string(),
            issued_at,
        };
        put_json_if_absent(self.store.as_ref(), &index_key(code), &entry).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wene_store::MemoryKvStore;

    struct SequenceCodeGenerator {
        codes: Mutex<std::collections::VecDeque<String>>,
    }

    impl SequenceCodeGenerator {
        fn new(codes: &[&str]) -> Self {
            Self {
                codes: Mutex::new(codes.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    impl CodeGenerator for SequenceCodeGenerator {
        fn next_code(&self) -> String {
            self.codes.try_lock().unwrap().pop_front().expect("sequence exhausted")
        }
    }

    #[tokio::test]
    async fn collision_forces_retry_to_next_candidate() {
        let generator = Arc::new(SequenceCodeGenerator::new(&["AAAAAA", "AAAAAA", "BBBBBB"]));
        let reservation =
            ConfirmationCodeReservation::with_generator(Arc::new(MemoryKvStore::new()), generator);

        let first = reservation.reserve("evt-1", "alice", 0).await.unwrap();
        assert_eq!(first, "AAAAAA");

        let second = reservation.reserve("evt-1", "bob", 0).await.unwrap();
        assert_eq!(second, "BBBBBB");
    }

    #[tokio::test]
    async fn release_only_clears_matching_subject() {
        let store = Arc::new(MemoryKvStore::new());
        let reservation = ConfirmationCodeReservation::new(store);
        reservation.ensure_indexed("evt-1", "alice", "ZZZZZZ", 0).await.unwrap();
        reservation.release("ZZZZZZ", "evt-1", "bob").await.unwrap();
        assert!(reservation.indexed("ZZZZZZ").await.unwrap().is_some());
        reservation.release("ZZZZZZ", "evt-1", "alice").await.unwrap();
        assert!(reservation.indexed("ZZZZZZ").await.unwrap().is_none());
    }
}
