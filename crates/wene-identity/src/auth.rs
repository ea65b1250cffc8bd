//! Token-to-role resolution (spec §4.G): master → demo → invite, with
//! constant-time comparison on the two static tokens so operator auth
//! doesn't leak timing information about the configured secrets.

use subtle::ConstantTimeEq;
use wene_store::AdminCodeRepo;
use wene_types::AdminRole;

use crate::config::IdentityConfig;
use crate::error::{IdentityError, IdentityResult};

pub struct IdentityService {
    config: IdentityConfig,
    codes: AdminCodeRepo,
}

impl IdentityService {
    pub fn new(config: IdentityConfig, codes: AdminCodeRepo) -> Self {
        Self { config, codes }
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Resolves a bearer token into an [`AdminRole`], following the
    /// master → demo → invite precedence. A revoked invite is unauthorized
    /// even if it happens to collide with no other token.
    pub async fn resolve(&self, token: &str) -> IdentityResult<AdminRole> {
        if let Some(master) = self.config.master_token() {
            if constant_time_eq(master, token) {
                return Ok(AdminRole::Master);
            }
        }
        if let Some(demo) = self.config.demo_token() {
            if constant_time_eq(demo, token) {
                return Ok(AdminRole::Demo);
            }
        }
        let record = self.codes.get(token).await?.ok_or(IdentityError::Unauthorized)?;
        if record.is_revoked() {
            return Err(IdentityError::Revoked);
        }
        Ok(AdminRole::Invited { admin_id: record.admin_id })
    }
}

fn constant_time_eq(expected: &str, candidate: &str) -> bool {
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wene_store::MemoryKvStore;
    use wene_types::AdminCodeRecord;

    fn service(master: Option<&str>, demo: Option<&str>) -> IdentityService {
        IdentityService::new(
            IdentityConfig::new(master.map(String::from), demo.map(String::from)),
            AdminCodeRepo::new(Arc::new(MemoryKvStore::new())),
        )
    }

    #[tokio::test]
    async fn master_takes_precedence_over_demo() {
        let svc = service(Some("m-token"), Some("m-token"));
        assert_eq!(svc.resolve("m-token").await.unwrap(), AdminRole::Master);
    }

    #[tokio::test]
    async fn demo_token_resolves_to_demo_role() {
        let svc = service(Some("m-token"), Some("d-token"));
        assert_eq!(svc.resolve("d-token").await.unwrap(), AdminRole::Demo);
    }

    #[tokio::test]
    async fn revoked_invite_is_unauthorized() {
        let codes = AdminCodeRepo::new(Arc::new(MemoryKvStore::new()));
        codes
            .put(
                "abc123",
                &AdminCodeRecord {
                    admin_id: "admin-1".to_string(),
                    name: "Alice".to_string(),
                    source: "invite".to_string(),
                    created_at: 0,
                    revoked_at: Some(1),
                    revoked_by: Some("master".to_string()),
                },
            )
            .await
            .unwrap();
        let svc = IdentityService::new(IdentityConfig::new(None, None), codes);
        assert!(matches!(svc.resolve("abc123").await, Err(IdentityError::Revoked)));
    }

    #[tokio::test]
    async fn active_invite_resolves_to_invited_role() {
        let codes = AdminCodeRepo::new(Arc::new(MemoryKvStore::new()));
        codes
            .put(
                "abc123",
                &AdminCodeRecord {
                    admin_id: "admin-1".to_string(),
                    name: "Alice".to_string(),
                    source: "invite".to_string(),
                    created_at: 0,
                    revoked_at: None,
                    revoked_by: None,
                },
            )
            .await
            .unwrap();
        let svc = IdentityService::new(IdentityConfig::new(None, None), codes);
        assert_eq!(
            svc.resolve("abc123").await.unwrap(),
            AdminRole::Invited { admin_id: "admin-1".to_string() }
        );
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let svc = service(Some("m-token"), None);
        assert!(matches!(svc.resolve("nope").await, Err(IdentityError::Unauthorized)));
    }
}
