//! WeNe crypto - Ed25519 signing, SHA-256 hashing, and canonical JSON for
//! the participation ledger.
//!
//! # Security invariant
//!
//! Signing keys never leave the [`Keypair`] that owns them; only
//! signatures and public keys cross crate boundaries.

pub mod canon;
pub mod hash;
pub mod keys;

pub use canon::*;
pub use hash::*;
pub use keys::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
