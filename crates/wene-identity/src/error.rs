//! Operator identity error types.

use thiserror::Error;

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("invite code has been revoked")]
    Revoked,

    #[error("master auth is required for this operation")]
    MasterRequired,

    #[error("operator does not own this event")]
    NotOwner,

    #[error("store error: {0}")]
    Store(#[from] wene_store::StoreError),
}
