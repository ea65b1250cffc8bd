//! SHA-256 hashing primitives. These, plus [`crate::canon`], are the only
//! hashing inputs anywhere in the system (spec §4.A).

use sha2::{Digest, Sha256};

/// Raw SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Hash several byte slices as if they were concatenated, without an
/// intermediate allocation for the concatenation itself. Used by the PoP
/// signer to hash its fixed-layout preimage.
pub fn hash_all(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub fn hash_all_hex(parts: &[&[u8]]) -> String {
    hex::encode(hash_all(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_of_empty_input_is_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_all_matches_concatenated_hash() {
        let concatenated = sha256_hex(b"foobar");
        assert_eq!(hash_all_hex(&[b"foo", b"bar"]), concatenated);
    }
}
