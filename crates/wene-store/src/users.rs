//! Registered-user storage and the user-id registration chain (spec §3
//! `User`, §5 `userIdRegistrationLock`).
//!
//! Locking discipline lives with the caller (`wene-receipts`, which owns
//! the registration workflow); this repo is pure storage.

use std::sync::Arc;

use wene_types::{User, UserIdChainLink};

use crate::error::StoreResult;
use crate::kv::{get_json, put_json, KvStore};

const USER_PREFIX: &str = "user:";
const USER_ID_INDEX_PREFIX: &str = "user_id_index:";
const USER_ID_CHAIN_LAST_HASH: &str = "user_id_chain:last_hash";

pub struct UserRepo {
    store: Arc<dyn KvStore>,
}

impl UserRepo {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: &str) -> StoreResult<Option<User>> {
        get_json(self.store.as_ref(), &format!("{USER_PREFIX}{user_id}")).await
    }

    pub async fn exists(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self.get(user_id).await?.is_some())
    }

    /// Registers a user. Caller is responsible for the uniqueness check
    /// happening under `userIdRegistrationLock` before this is invoked.
    pub async fn insert(&self, user: &User) -> StoreResult<()> {
        put_json(self.store.as_ref(), &format!("{USER_PREFIX}{}", user.user_id), user).await?;
        put_json(
            self.store.as_ref(),
            &format!("{USER_ID_INDEX_PREFIX}{}", user.user_id),
            &true,
        )
        .await
    }

    pub async fn chain_last_hash(&self) -> StoreResult<Option<String>> {
        Ok(self
            .store
            .get(USER_ID_CHAIN_LAST_HASH)
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub async fn advance_chain(&self, link: &UserIdChainLink) -> StoreResult<()> {
        self.store
            .put(
                USER_ID_CHAIN_LAST_HASH,
                link.chain_hash.clone().into_bytes(),
            )
            .await
    }
}
