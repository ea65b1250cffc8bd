//! Immutable sink fan-out (spec §4.B).
//!
//! The concrete sink providers (object store, KV index, HTTP ingest) are
//! external collaborators per spec §1; this module defines the narrow
//! capability traits the core calls through, ships one real
//! [`HttpIngestSink`] implementation over `reqwest` (the teacher's HTTP
//! client of choice), and keeps in-memory test doubles for the object
//! store and KV index under `testing`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wene_types::{CanonicalValue, ImmutableMode, ImmutableReceipt, SinkKind, SinkRecord};

use crate::error::{AuditError, AuditResult};

/// Outcome of a put-if-absent-or-verify object store write.
pub enum ObjectPutOutcome {
    Written,
    /// The key already existed; the caller must fetch and byte-compare.
    AlreadyExists,
}

#[async_trait]
pub trait ObjectStoreSink: Send + Sync {
    async fn put_if_absent(&self, key: &str, bytes: &[u8]) -> Result<ObjectPutOutcome, String>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String>;
}

#[async_trait]
pub trait KvIndexSink: Send + Sync {
    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), String>;
}

/// Outcome of an HTTP ingest POST.
pub struct HttpIngestOutcome {
    pub status: u16,
    /// The `x-immutable-receipt` response header, if present.
    pub receipt_header: Option<String>,
}

#[async_trait]
pub trait HttpIngestSink: Send + Sync {
    async fn post(
        &self,
        payload: &[u8],
        entry_hash: &str,
        payload_hash: &str,
    ) -> Result<HttpIngestOutcome, String>;
}

/// `reqwest`-backed HTTP ingest sink (spec §4.B step 3).
pub struct ReqwestIngestSink {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl ReqwestIngestSink {
    pub fn new(url: String, token: Option<String>, timeout_ms: u64) -> Self {
        let timeout_ms = if timeout_ms == 0 {
            wene_types::constants::DEFAULT_INGEST_TIMEOUT_MS
        } else {
            timeout_ms
        };
        Self {
            client: reqwest::Client::new(),
            url,
            token,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl HttpIngestSink for ReqwestIngestSink {
    async fn post(
        &self,
        payload: &[u8],
        entry_hash: &str,
        payload_hash: &str,
    ) -> Result<HttpIngestOutcome, String> {
        let mut request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .header("content-type", "application/json")
            .header("x-audit-entry-hash", entry_hash)
            .header("x-audit-payload-sha256", payload_hash)
            .body(payload.to_vec());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let receipt_header = response
            .headers()
            .get("x-immutable-receipt")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        Ok(HttpIngestOutcome {
            status,
            receipt_header,
        })
    }
}

/// The configured set of immutable sinks for this shard. Any subset may be
/// `None`; a `None` object-store and `None` http-ingest together means "no
/// primary sink configured" (spec §4.B).
#[derive(Clone, Default)]
pub struct ImmutableSinkSet {
    pub object_store: Option<Arc<dyn ObjectStoreSink>>,
    pub kv_index: Option<Arc<dyn KvIndexSink>>,
    pub http_ingest: Option<Arc<dyn HttpIngestSink>>,
}

impl ImmutableSinkSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_primary(&self) -> bool {
        self.object_store.is_some() || self.http_ingest.is_some()
    }
}

fn object_store_key_entry(entry_hash: &str) -> String {
    format!("audit/immutable/entry/{entry_hash}.json")
}

fn object_store_key_stream(event_id: &str, ts: &str, entry_hash: &str) -> String {
    let sanitized_ts = ts.replace([':', '.'], "-");
    format!(
        "audit/immutable/stream/{}/{sanitized_ts}_{entry_hash}.json",
        urlencoding::encode(event_id)
    )
}

/// Execute the immutable fan-out for one audit entry (spec §4.B).
pub async fn fan_out(
    entry_ts: &str,
    event_id: &str,
    entry_hash: &str,
    entry_json: &CanonicalValue,
    mode: ImmutableMode,
    source: &str,
    sinks: &ImmutableSinkSet,
) -> AuditResult<Option<ImmutableReceipt>> {
    if mode == ImmutableMode::Off {
        return Ok(None);
    }

    let payload = CanonicalValue::object([
        ("version", CanonicalValue::Number(serde_json::Number::from(1u64))),
        ("source", CanonicalValue::string(source)),
        ("entry", entry_json.clone()),
    ]);
    let payload_bytes = wene_crypto::to_canonical_bytes(&payload);
    let payload_hash = wene_crypto::canonical_hash_hex(&payload);

    if !sinks.has_primary() {
        return match mode {
            ImmutableMode::Required => Err(AuditError::SinkNotConfigured),
            _ => Ok(Some(ImmutableReceipt {
                mode,
                payload_hash,
                sinks: vec![],
                warnings: vec!["immutable audit sink is not configured".to_string()],
            })),
        };
    }

    let mut accepted: Vec<SinkRecord> = Vec::new();
    let mut blocking_errors: Vec<String> = Vec::new();
    let now = chrono::Utc::now().to_rfc3339();

    if let Some(object_store) = &sinks.object_store {
        let entry_key = object_store_key_entry(entry_hash);
        match object_store.put_if_absent(&entry_key, &payload_bytes).await {
            Ok(ObjectPutOutcome::Written) => accepted.push(SinkRecord {
                sink: SinkKind::R2Entry,
                sink_ref: entry_key.clone(),
                at: now.clone(),
            }),
            Ok(ObjectPutOutcome::AlreadyExists) => match object_store.get(&entry_key).await {
                Ok(Some(existing)) if existing == payload_bytes => accepted.push(SinkRecord {
                    sink: SinkKind::R2Entry,
                    sink_ref: entry_key.clone(),
                    at: now.clone(),
                }),
                _ => blocking_errors.push("immutable conflict detected".to_string()),
            },
            Err(e) => blocking_errors.push(format!("object store entry write failed: {e}")),
        }

        let stream_key = object_store_key_stream(event_id, entry_ts, entry_hash);
        match object_store.put_if_absent(&stream_key, &payload_bytes).await {
            Ok(ObjectPutOutcome::Written) => accepted.push(SinkRecord {
                sink: SinkKind::R2Stream,
                sink_ref: stream_key,
                at: now.clone(),
            }),
            Ok(ObjectPutOutcome::AlreadyExists) => match object_store.get(&stream_key).await {
                Ok(Some(existing)) if existing == payload_bytes => accepted.push(SinkRecord {
                    sink: SinkKind::R2Stream,
                    sink_ref: stream_key,
                    at: now.clone(),
                }),
                _ => blocking_errors.push("immutable conflict detected".to_string()),
            },
            Err(e) => blocking_errors.push(format!("object store stream write failed: {e}")),
        }
    }

    if let Some(kv_index) = &sinks.kv_index {
        let value = serde_json::json!({
            "ts": entry_ts,
            "eventId": event_id,
            "payloadHash": payload_hash,
        });
        if let Err(e) = kv_index
            .put(&format!("audit:immutable:{entry_hash}"), value)
            .await
        {
            tracing::warn!(error = %e, "kv index fan-out failed (best-effort)");
        }
    }

    if let Some(http_ingest) = &sinks.http_ingest {
        match http_ingest.post(&payload_bytes, entry_hash, &payload_hash).await {
            Ok(outcome) if (200..300).contains(&outcome.status) => {
                let sink_ref = outcome
                    .receipt_header
                    .unwrap_or_else(|| format!("http:{}", outcome.status));
                accepted.push(SinkRecord {
                    sink: SinkKind::ImmutableIngest,
                    sink_ref,
                    at: now.clone(),
                });
            }
            Ok(outcome) => {
                blocking_errors.push(format!("http ingest returned status {}", outcome.status))
            }
            Err(e) => blocking_errors.push(format!("http ingest failed: {e}")),
        }
    }

    let any_primary_accepted = accepted
        .iter()
        .any(|r| matches!(r.sink, SinkKind::R2Entry | SinkKind::ImmutableIngest));
    if !any_primary_accepted {
        blocking_errors.push("no immutable sink accepted this entry".to_string());
    }

    match mode {
        ImmutableMode::Required if !blocking_errors.is_empty() => {
            Err(AuditError::SinkRequestFailed(blocking_errors.join("; ")))
        }
        _ => Ok(Some(ImmutableReceipt {
            mode,
            payload_hash,
            sinks: accepted,
            warnings: blocking_errors,
        })),
    }
}

/// In-memory test doubles for the object store and KV index, used by this
/// crate's own tests and available to downstream crates exercising the
/// full dispatcher without a real cloud binding.
pub mod testing {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryObjectStore {
        objects: RwLock<std::collections::HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl ObjectStoreSink for InMemoryObjectStore {
        async fn put_if_absent(
            &self,
            key: &str,
            bytes: &[u8],
        ) -> Result<ObjectPutOutcome, String> {
            let mut guard = self.objects.write().await;
            if guard.contains_key(key) {
                return Ok(ObjectPutOutcome::AlreadyExists);
            }
            guard.insert(key.to_string(), bytes.to_vec());
            Ok(ObjectPutOutcome::Written)
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
            Ok(self.objects.read().await.get(key).cloned())
        }
    }

    #[derive(Default)]
    pub struct InMemoryKvIndex {
        pub entries: RwLock<std::collections::HashMap<String, serde_json::Value>>,
    }

    #[async_trait]
    impl KvIndexSink for InMemoryKvIndex {
        async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), String> {
            self.entries.write().await.insert(key.to_string(), value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use wene_types::Actor;

    fn sample_entry_json() -> CanonicalValue {
        CanonicalValue::object([
            ("ts", CanonicalValue::string("2026-01-01T00:00:00Z")),
            ("event", CanonicalValue::string("TEST")),
        ])
    }

    #[tokio::test]
    async fn off_mode_returns_no_receipt() {
        let result = fan_out(
            "2026-01-01T00:00:00Z",
            "evt-1",
            "hash1",
            &sample_entry_json(),
            ImmutableMode::Off,
            "test",
            &ImmutableSinkSet::none(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn required_mode_without_sink_fails_closed() {
        let result = fan_out(
            "2026-01-01T00:00:00Z",
            "evt-1",
            "hash1",
            &sample_entry_json(),
            ImmutableMode::Required,
            "test",
            &ImmutableSinkSet::none(),
        )
        .await;
        assert!(matches!(result, Err(AuditError::SinkNotConfigured)));
    }

    #[tokio::test]
    async fn best_effort_without_sink_returns_warning_receipt() {
        let result = fan_out(
            "2026-01-01T00:00:00Z",
            "evt-1",
            "hash1",
            &sample_entry_json(),
            ImmutableMode::BestEffort,
            "test",
            &ImmutableSinkSet::none(),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(!result.warnings.is_empty());
        assert!(result.sinks.is_empty());
    }

    #[tokio::test]
    async fn object_store_accepts_and_records_both_keys() {
        let sinks = ImmutableSinkSet {
            object_store: Some(std::sync::Arc::new(InMemoryObjectStore::default())),
            kv_index: None,
            http_ingest: None,
        };
        let receipt = fan_out(
            "2026-01-01T00:00:00Z",
            "evt-1",
            "hash1",
            &sample_entry_json(),
            ImmutableMode::Required,
            "test",
            &sinks,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(receipt.sinks.len(), 2);
        assert!(receipt
            .sinks
            .iter()
            .any(|s| matches!(s.sink, SinkKind::R2Entry)));
        assert!(receipt
            .sinks
            .iter()
            .any(|s| matches!(s.sink, SinkKind::R2Stream)));
    }

    #[tokio::test]
    async fn conflicting_object_store_write_is_blocking() {
        let store = std::sync::Arc::new(InMemoryObjectStore::default());
        store
            .put_if_absent("audit/immutable/entry/hash1.json", b"tampered")
            .await
            .unwrap();
        let sinks = ImmutableSinkSet {
            object_store: Some(store),
            kv_index: None,
            http_ingest: None,
        };
        let result = fan_out(
            "2026-01-01T00:00:00Z",
            "evt-1",
            "hash1",
            &sample_entry_json(),
            ImmutableMode::Required,
            "test",
            &sinks,
        )
        .await;
        assert!(matches!(result, Err(AuditError::SinkRequestFailed(_))));
    }

    #[test]
    fn actor_type_is_reexported_for_downstream_crates() {
        let _ = Actor {
            actor_type: wene_types::ActorType::System,
            id: "system".to_string(),
        };
    }
}
