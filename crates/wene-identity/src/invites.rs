//! Invite lifecycle: create, rename, revoke (spec §4.G). Invites are never
//! deleted; `revoke` only stamps `revokedAt`/`revokedBy`.

use wene_store::AdminCodeRepo;
use wene_types::{AdminCodeRecord, AdminRole};

use crate::error::{IdentityError, IdentityResult};

pub struct InviteService {
    codes: AdminCodeRepo,
}

impl InviteService {
    pub fn new(codes: AdminCodeRepo) -> Self {
        Self { codes }
    }

    /// Master-only: generates a fresh invite token and `adminId`.
    pub async fn create(&self, caller: &AdminRole, name: &str, now_ms: i64) -> IdentityResult<(String, AdminCodeRecord)> {
        require_master(caller)?;
        let token = uuid::Uuid::new_v4().simple().to_string();
        let admin_id = uuid::Uuid::new_v4().simple().to_string();
        let record = AdminCodeRecord {
            admin_id,
            name: name.to_string(),
            source: "invite".to_string(),
            created_at: now_ms,
            revoked_at: None,
            revoked_by: None,
        };
        self.codes.put(&token, &record).await?;
        Ok((token, record))
    }

    pub async fn rename(&self, caller: &AdminRole, token: &str, new_name: &str) -> IdentityResult<AdminCodeRecord> {
        require_master(caller)?;
        let mut record = self.codes.get(token).await?.ok_or(IdentityError::Unauthorized)?;
        record.name = new_name.to_string();
        self.codes.put(token, &record).await?;
        Ok(record)
    }

    pub async fn revoke(&self, caller: &AdminRole, token: &str, revoked_by: &str, now_ms: i64) -> IdentityResult<AdminCodeRecord> {
        require_master(caller)?;
        let mut record = self.codes.get(token).await?.ok_or(IdentityError::Unauthorized)?;
        record.revoked_at = Some(now_ms);
        record.revoked_by = Some(revoked_by.to_string());
        self.codes.put(token, &record).await?;
        Ok(record)
    }
}

fn require_master(caller: &AdminRole) -> IdentityResult<()> {
    if caller.is_master() {
        Ok(())
    } else {
        Err(IdentityError::MasterRequired)
    }
}
