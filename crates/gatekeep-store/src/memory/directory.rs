//! In-memory user directory for tests and single-node deployments.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use gatekeep_core::error::AppError;
use gatekeep_core::result::AppResult;
use gatekeep_core::traits::directory::UserDirectory;
use gatekeep_core::user::User;

/// Dashmap-backed [`UserDirectory`] implementation.
///
/// Ids are handed out from an atomic sequence, mirroring the rowid
/// behavior of a relational user table.
#[derive(Debug)]
pub struct MemoryDirectory {
    users: DashMap<i64, User>,
    next_id: AtomicI64,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().login == login)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, login: &str, password_hash: &str) -> AppResult<i64> {
        // Check-then-insert is not atomic across keys; acceptable for
        // single-node use.
        if self.find_by_login(login).await?.is_some() {
            return Err(AppError::duplicate_login(format!(
                "Login '{login}' already exists"
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.users.insert(
            id,
            User {
                id,
                login: login.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
                last_login_at: None,
            },
        );
        Ok(id)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool> {
        match self.users.get_mut(&id) {
            Some(mut entry) => {
                entry.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, id: i64) -> AppResult<()> {
        if let Some(mut entry) = self.users.get_mut(&id) {
            entry.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.users.remove(&id).is_some())
    }
}
