//! Ed25519 key handling: generation, seed/secret-key import, and base58
//! encoding of 32-byte public keys (grants, claimers, PoP signer pubkeys).

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::{CryptoError, CryptoResult};

/// A signing keypair. The signing key never leaves this type's owner.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derive a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Derive a keypair from a 64-byte Ed25519 secret key (seed || public key).
    pub fn from_secret_key_bytes(secret: &[u8; 64]) -> CryptoResult<Self> {
        let seed: [u8; 32] = secret[..32]
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyFormat("secret key truncated".into()))?;
        let signing_key = SigningKey::from_bytes(&seed);
        let expected_public: [u8; 32] = secret[32..]
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyFormat("secret key truncated".into()))?;
        if signing_key.verifying_key().to_bytes() != expected_public {
            return Err(CryptoError::InvalidKeyFormat(
                "embedded public key does not match derived key".into(),
            ));
        }
        Ok(Self { signing_key })
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.public_key_bytes()).into_string()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

/// Decode a base58 string into an exact-length byte array (spec: grant and
/// claimer public keys are exactly 32 bytes).
pub fn decode_base58_fixed<const N: usize>(encoded: &str) -> CryptoResult<[u8; N]> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid base58: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyFormat(format!("expected {N} bytes")))
}

pub fn verify_signature(
    public_key: &VerifyingKey,
    message: &[u8],
    signature: &Signature,
) -> CryptoResult<()> {
    public_key
        .verify(message, signature)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trips() {
        let keypair = Keypair::generate();
        let message = b"participation-ledger";
        let signature = keypair.sign(message);
        verify_signature(&keypair.verifying_key(), message, &signature).unwrap();
    }

    #[test]
    fn base58_round_trips_32_bytes() {
        let keypair = Keypair::generate();
        let encoded = keypair.public_key_base58();
        let decoded: [u8; 32] = decode_base58_fixed(&encoded).unwrap();
        assert_eq!(decoded, keypair.public_key_bytes());
    }

    #[test]
    fn rejects_wrong_length_base58() {
        let encoded = bs58::encode([1u8, 2, 3]).into_string();
        let result: CryptoResult<[u8; 32]> = decode_base58_fixed(&encoded);
        assert!(result.is_err());
    }
}
