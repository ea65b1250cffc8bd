//! Operator identity types (spec §3 `AdminCodeRecord`, §4.G).

use serde::{Deserialize, Serialize};

/// An invite-issued admin credential, keyed by its token. Never deleted;
/// revocation only sets `revoked_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCodeRecord {
    pub admin_id: String,
    pub name: String,
    pub source: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,
}

impl AdminCodeRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// The resolved identity of an authenticated operator, unifying the three
/// auth precedence paths (master / demo / invite) into one type so
/// disclosure scoping and per-event ownership checks don't stringly-type
/// role comparisons (SPEC_FULL.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum AdminRole {
    Master,
    Demo,
    Invited { admin_id: String },
}

impl AdminRole {
    pub fn is_master(&self) -> bool {
        matches!(self, AdminRole::Master)
    }

    /// `None` for master, since master is not scoped to a single admin id.
    pub fn admin_id(&self) -> Option<&str> {
        match self {
            AdminRole::Master => None,
            AdminRole::Demo => Some("demo"),
            AdminRole::Invited { admin_id } => Some(admin_id),
        }
    }
}
