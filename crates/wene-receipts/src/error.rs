//! Receipt and claim protocol error types (spec §4.D, §4.E, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("failed to generate unique confirmation code")]
    ConfirmationCodeExhausted,

    #[error("receipt not found")]
    NotFound,

    #[error("storage error: {0}")]
    Store(#[from] wene_store::StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] wene_audit::AuditError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed receipt: {0}")]
    Malformed(String),

    #[error("wallet_required")]
    WalletRequired,
}

pub type ReceiptResult<T> = Result<T, ReceiptError>;
