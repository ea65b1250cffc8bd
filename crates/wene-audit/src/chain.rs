//! The audit chain engine: append, history listing, integrity verification
//! (spec §4.C).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use wene_store::{get_json, list_prefix_json, put_json, KvStore};
use wene_types::constants::{AUDIT_HISTORY_PAGE_SIZE, GENESIS};
use wene_types::{Actor, AuditEntry, ImmutableMode};

use crate::error::AuditResult;
use crate::sinks::{fan_out, ImmutableSinkSet};

fn global_head_key() -> &'static str {
    "audit:lastHash:global"
}

fn stream_head_key(event_id: &str) -> String {
    format!("audit:lastHash:{event_id}")
}

fn history_key(ts: &str, entry_hash: &str) -> String {
    format!("audit_history:{ts}:{entry_hash}")
}

fn entry_key(entry_hash: &str) -> String {
    format!("audit_entry:{entry_hash}")
}

/// Owns the single process-wide audit lock (spec §5 `auditLock`): every
/// append, including the one nested inside a PoP proof issuance, is
/// serialized through `self.lock`. The lock is held across the immutable
/// fan-out's network I/O by design — that's what makes the receipt atomic
/// with the chain advance (spec §5).
pub struct AuditChain {
    store: Arc<dyn KvStore>,
    sinks: ImmutableSinkSet,
    mode: ImmutableMode,
    source: String,
    lock: Mutex<()>,
}

impl AuditChain {
    pub fn new(store: Arc<dyn KvStore>, sinks: ImmutableSinkSet, mode: ImmutableMode, source: impl Into<String>) -> Self {
        Self {
            store,
            sinks,
            mode,
            source: source.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn mode(&self) -> ImmutableMode {
        self.mode
    }

    pub fn sinks(&self) -> &ImmutableSinkSet {
        &self.sinks
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The current global chain head, `"GENESIS"` if nothing has been
    /// appended yet. Used as a cache-invalidation key by consumers like
    /// `wene-search`'s index cache.
    pub async fn global_head(&self) -> AuditResult<String> {
        self.head(global_head_key()).await
    }

    async fn head(&self, key: &str) -> AuditResult<String> {
        Ok(self
            .store
            .get(key)
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_else(|| GENESIS.to_string()))
    }

    /// Append one mutating event to both the global chain and the
    /// `event_id` stream chain.
    pub async fn append(
        &self,
        event: &str,
        event_id: &str,
        actor: Actor,
        data: wene_types::CanonicalValue,
    ) -> AuditResult<AuditEntry> {
        let _guard = self.lock.lock().await;

        let prev_hash = self.head(global_head_key()).await?;
        let stream_prev_hash = self.head(&stream_head_key(event_id)).await?;
        let ts = chrono::Utc::now().to_rfc3339();

        let mut entry = AuditEntry {
            ts: ts.clone(),
            event: event.to_string(),
            event_id: event_id.to_string(),
            actor,
            data,
            prev_hash,
            stream_prev_hash,
            entry_hash: String::new(),
            immutable: None,
        };
        entry.entry_hash = wene_crypto::canonical_hash_hex(&entry.hash_input());

        let entry_json: wene_types::CanonicalValue =
            serde_json::to_value(&entry).unwrap_or(serde_json::Value::Null).into();
        entry.immutable = fan_out(
            &ts,
            event_id,
            &entry.entry_hash,
            &entry_json,
            self.mode,
            &self.source,
            &self.sinks,
        )
        .await?;

        self.store
            .put(global_head_key(), entry.entry_hash.clone().into_bytes())
            .await?;
        self.store
            .put(
                &stream_head_key(event_id),
                entry.entry_hash.clone().into_bytes(),
            )
            .await?;
        put_json(self.store.as_ref(), &history_key(&ts, &entry.entry_hash), &entry).await?;
        put_json(self.store.as_ref(), &entry_key(&entry.entry_hash), &entry).await?;

        tracing::debug!(event, event_id, entry_hash = %entry.entry_hash, "audit entry appended");
        Ok(entry)
    }

    pub async fn by_hash(&self, entry_hash: &str) -> AuditResult<Option<AuditEntry>> {
        Ok(get_json(self.store.as_ref(), &entry_key(entry_hash)).await?)
    }

    /// Most recent entries by reverse-ordered key scan of `audit_history:`
    /// (spec §4.C `getAuditLogs`), bounded by `limit`.
    pub async fn history_page(&self, limit: usize) -> AuditResult<Vec<AuditEntry>> {
        let rows: Vec<(String, AuditEntry)> =
            list_prefix_json(self.store.as_ref(), "audit_history:", Some(limit), true).await?;
        Ok(rows.into_iter().map(|(_, e)| e).collect())
    }

    /// `getAuditLogs()` — the bare most-recent-50 listing (spec §4.C).
    pub async fn recent(&self) -> AuditResult<Vec<AuditEntry>> {
        self.history_page(AUDIT_HISTORY_PAGE_SIZE).await
    }

    pub async fn verify_integrity(
        &self,
        limit: usize,
        verify_immutable: bool,
    ) -> AuditResult<IntegrityReport> {
        let limit = limit.clamp(1, wene_types::constants::AUDIT_INTEGRITY_MAX_LIMIT);
        let entries = self.history_page(limit).await?;
        let checked = entries.len();

        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        for entry in &entries {
            let recomputed = wene_crypto::canonical_hash_hex(&entry.hash_input());
            if recomputed != entry.entry_hash {
                issues.push(format!("entry_hash_mismatch:{}", entry.entry_hash));
            }
        }

        check_chain_discipline(&entries, |e| &e.prev_hash, "global", &mut issues);
        for (event_id, stream) in group_by_event(&entries) {
            check_chain_discipline(&stream, |e| &e.stream_prev_hash, &format!("stream:{event_id}"), &mut issues);
        }

        if verify_immutable && self.mode != ImmutableMode::Off {
            for entry in &entries {
                match &entry.immutable {
                    None => issues.push(format!("missing_immutable_receipt:{}", entry.entry_hash)),
                    Some(receipt) => {
                        let mut unstamped = entry.clone();
                        unstamped.immutable = None;
                        let entry_json: wene_types::CanonicalValue = serde_json::to_value(&unstamped)
                            .unwrap_or(serde_json::Value::Null)
                            .into();
                        let payload = wene_types::CanonicalValue::object([
                            ("version", wene_types::CanonicalValue::Number(serde_json::Number::from(1u64))),
                            ("source", wene_types::CanonicalValue::string(self.source.clone())),
                            ("entry", entry_json),
                        ]);
                        let recomputed_payload_hash = wene_crypto::canonical_hash_hex(&payload);
                        if recomputed_payload_hash != receipt.payload_hash {
                            issues.push(format!("payload_hash_mismatch:{}", entry.entry_hash));
                        }
                        let has_primary = receipt.sinks.iter().any(|s| {
                            matches!(
                                s.sink,
                                wene_types::SinkKind::R2Entry | wene_types::SinkKind::ImmutableIngest
                            )
                        });
                        if !has_primary {
                            issues.push(format!("no_primary_sink_accepted:{}", entry.entry_hash));
                        }
                        for sink in receipt.sinks.iter().filter(|s| s.sink == wene_types::SinkKind::R2Entry) {
                            match &self.sinks.object_store {
                                Some(object_store) => {
                                    match object_store.get(&sink.sink_ref).await {
                                        Ok(Some(bytes)) => {
                                            let expected = wene_crypto::to_canonical_bytes(&payload);
                                            if bytes != expected {
                                                issues.push(format!(
                                                    "immutable_payload_mismatch:{}",
                                                    entry.entry_hash
                                                ));
                                            }
                                        }
                                        _ => issues.push(format!(
                                            "immutable_object_missing:{}",
                                            entry.entry_hash
                                        )),
                                    }
                                }
                                None => warnings.push(format!(
                                    "no object store binding to verify {}",
                                    entry.entry_hash
                                )),
                            }
                        }
                    }
                }
            }
        }

        let global_head = self.head(global_head_key()).await?;
        let oldest_in_window = entries.last().map(|e| e.entry_hash.clone());

        Ok(IntegrityReport {
            ok: issues.is_empty(),
            mode: self.mode,
            checked,
            limit,
            global_head,
            oldest_in_window,
            verify_immutable,
            issues,
            warnings,
            inspected_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

fn group_by_event(entries: &[AuditEntry]) -> Vec<(String, Vec<AuditEntry>)> {
    let mut by_event: HashMap<String, Vec<AuditEntry>> = HashMap::new();
    for entry in entries {
        by_event
            .entry(entry.event_id.clone())
            .or_default()
            .push(entry.clone());
    }
    by_event.into_iter().collect()
}

/// Validate one chain discipline (global or per-stream): exactly one head,
/// no duplicates, no cycles, no parent referenced twice (spec §4.C).
fn check_chain_discipline(
    entries: &[AuditEntry],
    prev_of: impl Fn(&AuditEntry) -> &String,
    label: &str,
    issues: &mut Vec<String>,
) {
    let hashes: HashSet<&str> = entries.iter().map(|e| e.entry_hash.as_str()).collect();
    if hashes.len() != entries.len() {
        issues.push(format!("{label}:duplicate_entry_hash"));
    }

    let mut parent_refs: HashMap<&str, u32> = HashMap::new();
    let mut leaving_window = 0usize;
    for entry in entries {
        let prev = prev_of(entry).as_str();
        if prev == GENESIS {
            continue;
        }
        *parent_refs.entry(prev).or_insert(0) += 1;
        if !hashes.contains(prev) {
            leaving_window += 1;
        }
    }
    if parent_refs.values().any(|&count| count > 1) {
        issues.push(format!("{label}:multiple_references_to_same_parent"));
    }
    if leaving_window > 1 {
        issues.push(format!("{label}:multiple_parents_leave_window"));
    }

    let referenced_as_parent: HashSet<&str> = parent_refs.keys().copied().collect();
    let heads: usize = entries
        .iter()
        .filter(|e| !referenced_as_parent.contains(e.entry_hash.as_str()))
        .count();
    if heads != 1 {
        issues.push(format!("{label}:expected_exactly_one_head"));
    }
}

/// Integrity verifier result (spec §4.C). HTTP status: 200 on `ok`, else
/// 409 — decided by `wene-api`, not this type.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IntegrityReport {
    pub ok: bool,
    pub mode: ImmutableMode,
    pub checked: usize,
    pub limit: usize,
    pub global_head: String,
    pub oldest_in_window: Option<String>,
    pub verify_immutable: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub inspected_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wene_store::MemoryKvStore;
    use wene_types::ActorType;

    fn actor() -> Actor {
        Actor {
            actor_type: ActorType::System,
            id: "test".to_string(),
        }
    }

    fn data() -> wene_types::CanonicalValue {
        wene_types::CanonicalValue::object([("foo", wene_types::CanonicalValue::string("bar"))])
    }

    fn chain() -> AuditChain {
        AuditChain::new(
            Arc::new(MemoryKvStore::new()),
            ImmutableSinkSet::none(),
            ImmutableMode::Off,
            "test",
        )
    }

    #[tokio::test]
    async fn genesis_append_has_genesis_prev_hashes() {
        let chain = chain();
        let entry = chain
            .append("TEST", "event-123", actor(), data())
            .await
            .unwrap();
        assert_eq!(entry.prev_hash, "GENESIS");
        assert_eq!(entry.stream_prev_hash, "GENESIS");
        assert_eq!(chain.head(global_head_key()).await.unwrap(), entry.entry_hash);
        assert_eq!(
            chain.head(&stream_head_key("event-123")).await.unwrap(),
            entry.entry_hash
        );
    }

    #[tokio::test]
    async fn cross_event_chain_interleaves_global_but_not_stream() {
        let chain = chain();
        let a1 = chain.append("TEST", "event-A", actor(), data()).await.unwrap();
        let b1 = chain.append("TEST", "event-B", actor(), data()).await.unwrap();
        let a2 = chain.append("TEST", "event-A", actor(), data()).await.unwrap();

        assert_eq!(a1.prev_hash, "GENESIS");
        assert_eq!(b1.prev_hash, a1.entry_hash);
        assert_eq!(a2.prev_hash, b1.entry_hash);

        assert_eq!(a1.stream_prev_hash, "GENESIS");
        assert_eq!(b1.stream_prev_hash, "GENESIS");
        assert_eq!(a2.stream_prev_hash, a1.entry_hash);
    }

    #[tokio::test]
    async fn required_mode_without_sink_blocks_before_pointers_advance() {
        let chain = AuditChain::new(
            Arc::new(MemoryKvStore::new()),
            ImmutableSinkSet::none(),
            ImmutableMode::Required,
            "test",
        );
        let result = chain.append("TEST", "event-1", actor(), data()).await;
        assert!(result.is_err());
        assert_eq!(chain.head(global_head_key()).await.unwrap(), "GENESIS");
    }

    #[tokio::test]
    async fn concurrent_appends_to_the_same_stream_stay_chained() {
        let chain = Arc::new(chain());
        let mut tasks = Vec::new();
        for _ in 0..20 {
            let chain = chain.clone();
            tasks.push(tokio::spawn(async move {
                chain.append("TEST", "event-1", actor(), data()).await.unwrap()
            }));
        }
        let mut entries = Vec::new();
        for task in tasks {
            entries.push(task.await.unwrap());
        }

        let mut by_hash: HashMap<String, String> = entries
            .iter()
            .map(|e| (e.entry_hash.clone(), e.stream_prev_hash.clone()))
            .collect();
        assert_eq!(by_hash.len(), entries.len(), "no two appends produced the same entry hash");

        // Follow the stream chain back from the head; it must visit every
        // entry exactly once with no branching (the mutex serializes appends
        // so concurrent callers never observe or extend a stale prev hash).
        let mut cursor = chain.head(&stream_head_key("event-1")).await.unwrap();
        let mut visited = 0;
        while cursor != "GENESIS" {
            cursor = by_hash.remove(&cursor).expect("chain references a recorded entry");
            visited += 1;
        }
        assert_eq!(visited, entries.len());
    }

    #[tokio::test]
    async fn tampered_history_entry_fails_integrity_check() {
        let chain = chain();
        let entry = chain.append("TEST", "event-1", actor(), data()).await.unwrap();

        let mut tampered = entry.clone();
        tampered.data = wene_types::CanonicalValue::object([(
            "v",
            wene_types::CanonicalValue::Number(serde_json::Number::from(999)),
        )]);
        put_json(
            chain.store.as_ref(),
            &history_key(&entry.ts, &entry.entry_hash),
            &tampered,
        )
        .await
        .unwrap();

        let report = chain.verify_integrity(20, false).await.unwrap();
        assert!(!report.ok);
        assert!(report
            .issues
            .iter()
            .any(|issue| issue.starts_with("entry_hash_mismatch")));
    }
}
