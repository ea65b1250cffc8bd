//! Registered-user type and the user-id registration chain entry (spec §3
//! `User`).

use serde::{Deserialize, Serialize};

/// A participant registered with a user id and a PIN, as opposed to a
/// wallet address or join token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Normalized lowercase, 3-32 chars of `[a-z0-9._-]`, first char
    /// alphanumeric. Unique.
    pub user_id: String,
    pub display_name: String,
    /// `SHA-256(pin)` hex. The PIN itself is never stored.
    pub pin_hash: String,
    pub created_at: i64,
}

/// One link of the append-only user-id registration chain. Hashed with
/// `canon({version:1, kind:"user_id_register", user_id_hash, prev_chain_hash})`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdChainLink {
    pub version: u8,
    pub kind: String,
    pub user_id_hash: String,
    pub prev_chain_hash: String,
    pub chain_hash: String,
}
