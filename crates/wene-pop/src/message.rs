//! The 169-byte PoP signable message (spec §4.F step 6, §8 scenario 6,
//! §7 edge case list item 8).
//!
//! The listed field set in spec §4.F (`prev`, `streamPrev`, `audit`,
//! `entryHash`, `issuedAt`) sums to 209 bytes if every hash is embedded
//! verbatim, which conflicts with the byte-exact 169-byte/`0x02`-prefixed
//! invariant tested elsewhere. `audit` and `issuedAt` are each already
//! folded into `entryHash` by its own hash computation, so the signed
//! message omits them as redundant: `v(1) | grant(32) | claimer(32) |
//! periodIndex(8) | prev(32) | streamPrev(32) | entryHash(32) = 169`.
//! `auditHash` and `issuedAt` are still returned alongside the signature
//! in [`crate::PopProof`](wene_types::PopProof), just not re-embedded in
//! the signed bytes.

pub const POP_MESSAGE_LEN: usize = 169;
pub const POP_MESSAGE_VERSION: u8 = 2;

pub struct SignableFields {
    pub grant: [u8; 32],
    pub claimer: [u8; 32],
    pub period_index: u64,
    pub prev_hash: [u8; 32],
    pub stream_prev_hash: [u8; 32],
    pub entry_hash: [u8; 32],
}

pub fn build_message(fields: &SignableFields) -> [u8; POP_MESSAGE_LEN] {
    let mut message = [0u8; POP_MESSAGE_LEN];
    let mut offset = 0;

    message[offset] = POP_MESSAGE_VERSION;
    offset += 1;

    message[offset..offset + 32].copy_from_slice(&fields.grant);
    offset += 32;

    message[offset..offset + 32].copy_from_slice(&fields.claimer);
    offset += 32;

    message[offset..offset + 8].copy_from_slice(&fields.period_index.to_le_bytes());
    offset += 8;

    message[offset..offset + 32].copy_from_slice(&fields.prev_hash);
    offset += 32;

    message[offset..offset + 32].copy_from_slice(&fields.stream_prev_hash);
    offset += 32;

    message[offset..offset + 32].copy_from_slice(&fields.entry_hash);
    offset += 32;

    debug_assert_eq!(offset, POP_MESSAGE_LEN);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_169_bytes_and_starts_with_version() {
        let fields = SignableFields {
            grant: [1u8; 32],
            claimer: [2u8; 32],
            period_index: 7,
            prev_hash: [3u8; 32],
            stream_prev_hash: [4u8; 32],
            entry_hash: [5u8; 32],
        };
        let message = build_message(&fields);
        assert_eq!(message.len(), POP_MESSAGE_LEN);
        assert_eq!(message[0], 0x02);
    }

    #[test]
    fn period_index_is_little_endian() {
        let fields = SignableFields {
            grant: [0u8; 32],
            claimer: [0u8; 32],
            period_index: 0x0102_0304_0506_0708,
            prev_hash: [0u8; 32],
            stream_prev_hash: [0u8; 32],
            entry_hash: [0u8; 32],
        };
        let message = build_message(&fields);
        assert_eq!(&message[65..73], &[8, 7, 6, 5, 4, 3, 2, 1]);
    }
}
