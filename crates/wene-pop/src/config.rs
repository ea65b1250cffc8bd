//! PoP signer configuration and lazy, once-validated signing state (spec
//! §4.F, grounded on the teacher's `OnceLock`-cached vault singleton).

use std::sync::{Arc, OnceLock};

use wene_crypto::Keypair;

use crate::error::{PopError, PopResult};

/// Raw environment configuration for the PoP signer.
#[derive(Debug, Clone)]
pub struct PopSignerConfig {
    /// Base64-encoded 32-byte seed or 64-byte secret key.
    pub secret_key_b64: Option<String>,
    /// Base58-encoded 32-byte public key, cross-checked against the
    /// derived key.
    pub pubkey_b58: Option<String>,
    pub enforce_onchain_pop: bool,
}

impl PopSignerConfig {
    pub fn from_env() -> Self {
        let enforce = std::env::var("ENFORCE_ONCHAIN_POP")
            .map(|raw| !matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(true);
        Self {
            secret_key_b64: std::env::var("POP_SIGNER_SECRET_KEY_B64").ok(),
            pubkey_b58: std::env::var("POP_SIGNER_PUBKEY").ok(),
            enforce_onchain_pop: enforce,
        }
    }
}

/// The validated signer: a keypair whose derived public key has already
/// been cross-checked against the configured base58 public key, if any.
pub struct SignerState {
    pub keypair: Keypair,
}

/// Lazily derives and validates signer state from configuration once,
/// caching either the validated state or the configuration error for the
/// lifetime of the process — a mismatch raises on first use and on every
/// use thereafter, it does not re-derive.
pub struct PopSigner {
    config: PopSignerConfig,
    state: OnceLock<Result<Arc<SignerState>, String>>,
}

impl PopSigner {
    pub fn new(config: PopSignerConfig) -> Self {
        Self {
            config,
            state: OnceLock::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(PopSignerConfig::from_env())
    }

    pub fn enforce_onchain_pop(&self) -> bool {
        self.config.enforce_onchain_pop
    }

    fn derive(&self) -> Result<SignerState, String> {
        let raw = self
            .config
            .secret_key_b64
            .as_deref()
            .ok_or_else(|| "POP_SIGNER_SECRET_KEY_B64 not configured".to_string())?;
        let bytes = base64_decode(raw).map_err(|e| format!("invalid base64 secret key: {e}"))?;

        let keypair = match bytes.len() {
            32 => {
                let seed: [u8; 32] = bytes.try_into().expect("checked length");
                Keypair::from_seed(&seed)
            }
            64 => {
                let secret: [u8; 64] = bytes.try_into().expect("checked length");
                Keypair::from_secret_key_bytes(&secret)
                    .map_err(|e| format!("invalid secret key bytes: {e}"))?
            }
            other => {
                return Err(format!(
                    "secret key must decode to 32 (seed) or 64 (secret key) bytes, got {other}"
                ))
            }
        };

        if let Some(expected_b58) = &self.config.pubkey_b58 {
            let derived_b58 = keypair.public_key_base58();
            if &derived_b58 != expected_b58 {
                return Err(format!(
                    "derived public key {derived_b58} does not match configured POP_SIGNER_PUBKEY"
                ));
            }
        }

        Ok(SignerState { keypair })
    }

    /// Returns the validated signer state, deriving and caching it on
    /// first call. A configuration error is cached too, and re-raised on
    /// every subsequent call rather than re-derived.
    pub fn state(&self) -> PopResult<Arc<SignerState>> {
        self.state
            .get_or_init(|| self.derive().map(Arc::new))
            .clone()
            .map_err(PopError::InvalidConfig)
    }
}

fn base64_decode(raw: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| e.to_string())
}
