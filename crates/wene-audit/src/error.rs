//! Audit engine error types (spec §4.B, §4.C, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("immutable audit sink is not configured")]
    SinkNotConfigured,

    #[error("immutable conflict detected")]
    ImmutableConflict,

    #[error("no immutable sink accepted this entry")]
    NoSinkAccepted,

    #[error("immutable sink request failed: {0}")]
    SinkRequestFailed(String),

    #[error("storage error: {0}")]
    Store(#[from] wene_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;
