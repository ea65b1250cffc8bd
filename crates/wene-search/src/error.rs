//! Disclosure and search error types.

use thiserror::Error;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("master auth is required for disclosure and search")]
    MasterRequired,

    #[error("store error: {0}")]
    Store(#[from] wene_store::StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] wene_audit::AuditError),
}
