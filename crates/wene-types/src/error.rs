//! Error types shared across the workspace.
//!
//! Each crate below this one additionally defines its own narrower
//! `thiserror` enum for its internal failure modes; `WeneError` is the
//! taxonomy that survives to the API boundary (spec §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeneError>;

/// Stable error taxonomy mapped to HTTP status by `wene-api::error`.
#[derive(Debug, Clone, Error)]
pub enum WeneError {
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error("unauthorized: {reason}")]
    Auth { reason: String },

    #[error("forbidden: {reason}")]
    Authorization { reason: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("immutable audit sink error: {reason}")]
    ImmutableSink { reason: String },

    #[error("audit log persistence failed: {reason}")]
    AuditPersistence { reason: String },

    #[error("PoP configuration error: {reason}")]
    PopConfig { reason: String },

    #[error("internal server error: {message}")]
    Internal { message: String },
}

impl WeneError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// HTTP status code this error maps to (spec §7).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Auth { .. } => 401,
            Self::Authorization { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::ImmutableSink { .. } => 503,
            Self::AuditPersistence { .. } => 503,
            Self::PopConfig { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }
}

/// The claim-surface failure taxonomy (spec §7): the claim responder never
/// raises across the API boundary, it folds errors into a result using
/// these stable tags instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimFailure {
    Invalid,
    NotFound,
    Eligibility,
    Retryable,
    UserCancel,
    WalletRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(WeneError::not_found("event").status_code(), 404);
        assert_eq!(WeneError::conflict("dup").status_code(), 409);
        assert_eq!(
            WeneError::PopConfig {
                reason: "x".into()
            }
            .status_code(),
            500
        );
    }
}
