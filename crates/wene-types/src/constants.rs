//! Shared constants referenced by more than one crate.
//!
//! Centralized here so `wene-receipts` and `wene-pop` (and anything else
//! that needs to parse or emit these values) import one definition instead
//! of redeclaring magic strings.

/// Confirmation-code alphabet: Crockford-like base32 without `I`, `O`, `0`, `1`
/// to avoid visual ambiguity on printed tickets.
pub const CONFIRMATION_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a generated confirmation code.
pub const CONFIRMATION_CODE_LEN: usize = 6;

/// Maximum draws attempted before `submit_claim`'s code reservation gives up.
pub const CONFIRMATION_CODE_MAX_DRAWS: u32 = 128;

/// Domain separator mixed into every PoP entry hash, pinning the wire format
/// version so old and new signers never collide on the same preimage.
pub const POP_DOMAIN_SEPARATOR: &str = "we-ne:pop:v2";

/// PoP signable message protocol version (first byte of the 169-byte message).
pub const POP_MESSAGE_VERSION: u8 = 2;

/// Total length in bytes of a PoP signable message.
pub const POP_MESSAGE_LEN: usize = 169;

/// Sentinel value for "no predecessor yet" in both the audit chain and the
/// PoP chain.
pub const GENESIS: &str = "GENESIS";

/// Default timeout for the HTTP immutable-ingest sink, in milliseconds.
pub const DEFAULT_INGEST_TIMEOUT_MS: u64 = 5000;

/// Placeholder master password that counts as "not configured".
pub const ADMIN_PASSWORD_PLACEHOLDER: &str = "change-this-in-dashboard";

/// `getAuditLogs()` / disclosure window size.
pub const AUDIT_HISTORY_PAGE_SIZE: usize = 50;

/// Bound on `GET /api/master/audit-integrity?limit=`.
pub const AUDIT_INTEGRITY_MAX_LIMIT: usize = 200;

/// In-process search-index cache TTL.
pub const SEARCH_CACHE_TTL_SECS: u64 = 30;

/// Number of most-recent SQL-backed search indexes retained before pruning.
pub const SEARCH_INDEX_RETAIN: usize = 5;
