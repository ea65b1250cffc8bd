//! Canonical JSON serialization and hashing (spec §4.A).
//!
//! Objects are key-sorted recursively, arrays preserve order, numbers are
//! emitted exactly as `serde_json` would render them, and strings use
//! `serde_json`'s minimal-escaping string encoder. Because
//! [`wene_types::CanonicalValue`]'s object variant is `BTreeMap`-backed,
//! rendering it through `serde_json::to_vec` already produces a
//! recursively key-sorted document — there is no separate sort pass.

use wene_types::CanonicalValue;

use crate::hash::sha256_hex;

/// Render a [`CanonicalValue`] to its canonical UTF-8 byte form.
pub fn to_canonical_bytes(value: &CanonicalValue) -> Vec<u8> {
    serde_json::to_vec(value).expect("CanonicalValue always serializes")
}

/// `sha256Hex(canon(value))` — the only hashing path used across the
/// audit chain, receipts, and the PoP signer.
pub fn canonical_hash_hex(value: &CanonicalValue) -> String {
    sha256_hex(&to_canonical_bytes(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = CanonicalValue::object([
            ("b", CanonicalValue::Bool(true)),
            ("a", CanonicalValue::string("x")),
        ]);
        let b = CanonicalValue::object([
            ("a", CanonicalValue::string("x")),
            ("b", CanonicalValue::Bool(true)),
        ]);
        assert_eq!(canonical_hash_hex(&a), canonical_hash_hex(&b));
    }

    #[test]
    fn nested_objects_sort_recursively() {
        let value = CanonicalValue::object([(
            "outer",
            CanonicalValue::object([
                ("z", CanonicalValue::Null),
                ("a", CanonicalValue::Null),
            ]),
        )]);
        let bytes = to_canonical_bytes(&value);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"z\"").unwrap());
    }
}
