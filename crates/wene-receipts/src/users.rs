//! Participant user-id registration workflow (spec §4.A `userIdRegistrationLock`,
//! §3 `User`).

use std::sync::Arc;

use tokio::sync::Mutex;
use wene_crypto::sha256_hex;
use wene_store::{KvStore, UserRepo};
use wene_types::{CanonicalValue, User, UserIdChainLink};

use crate::error::{ReceiptError, ReceiptResult};

pub struct UserRegistry {
    repo: UserRepo,
    lock: Mutex<()>,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            repo: UserRepo::new(store),
            lock: Mutex::new(()),
        }
    }

    pub async fn get(&self, user_id: &str) -> ReceiptResult<Option<User>> {
        Ok(self.repo.get(user_id).await?)
    }

    /// Registers a new user id under `userIdRegistrationLock`: rejects a
    /// collision, then advances the user-id registration chain with
    /// `canon({version:1, kind:"user_id_register", userIdHash, prevChainHash})`.
    pub async fn register(
        &self,
        user_id: &str,
        display_name: &str,
        pin_hash: &str,
        registered_at: i64,
    ) -> ReceiptResult<User> {
        let _guard = self.lock.lock().await;

        if self.repo.exists(user_id).await? {
            return Err(ReceiptError::Malformed(format!(
                "user id already registered: {user_id}"
            )));
        }

        let user = User {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            pin_hash: pin_hash.to_string(),
            created_at: registered_at,
        };
        self.repo.insert(&user).await?;

        let prev_chain_hash = self
            .repo
            .chain_last_hash()
            .await?
            .unwrap_or_else(|| wene_types::constants::GENESIS.to_string());
        let user_id_hash = sha256_hex(user_id.as_bytes());
        let chain_value = CanonicalValue::object([
            ("version", CanonicalValue::Number(serde_json::Number::from(1u64))),
            ("kind", CanonicalValue::string("user_id_register")),
            ("userIdHash", CanonicalValue::string(user_id_hash.clone())),
            ("prevChainHash", CanonicalValue::string(prev_chain_hash.clone())),
        ]);
        let chain_hash = wene_crypto::canonical_hash_hex(&chain_value);
        self.repo
            .advance_chain(&UserIdChainLink {
                version: 1,
                kind: "user_id_register".to_string(),
                user_id_hash,
                prev_chain_hash,
                chain_hash,
            })
            .await?;

        Ok(user)
    }

    /// PIN verification: caller supplies the candidate hash; no secret
    /// comparison logic lives here beyond equality on the stored digest.
    pub async fn verify_pin(&self, user_id: &str, pin_hash: &str) -> ReceiptResult<bool> {
        match self.repo.get(user_id).await? {
            Some(user) => Ok(user.pin_hash == pin_hash),
            None => Ok(false),
        }
    }
}
