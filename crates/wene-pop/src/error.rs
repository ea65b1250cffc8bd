//! PoP signer error types (spec §4.F). Fails closed: a misconfigured or
//! unvalidated signer never issues a proof.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PopError {
    #[error("pop signer misconfigured: {0}")]
    InvalidConfig(String),

    #[error("event not found")]
    EventNotFound,

    #[error("event is not published")]
    EventNotPublished,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Store(#[from] wene_store::StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] wene_audit::AuditError),
}

pub type PopResult<T> = Result<T, PopError>;
