//! Revocable token records in the key-value store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gatekeep_core::error::AppError;
use gatekeep_core::result::AppResult;
use gatekeep_core::traits::kv::KvBackend;
use gatekeep_store::keys;

/// Store-side record for an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Owning user ID.
    pub user_id: i64,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// A token listed for a user, with its record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserToken {
    /// The bearer token string.
    pub token: String,
    /// Its store record.
    pub record: TokenRecord,
}

/// Keyed, expiring, revocable storage for session tokens.
///
/// All coordination relies on the backend's atomic single-key
/// operations; there is no multi-key transaction. Every call is
/// bounded by the configured operation timeout and treated as failed
/// when it elapses, so a slow store can never hang a caller.
#[derive(Debug, Clone)]
pub struct TokenStore {
    /// The backing key-value store.
    kv: Arc<dyn KvBackend>,
    /// Upper bound on any single store operation.
    op_timeout: Duration,
}

impl TokenStore {
    /// Create a token store over the given backend.
    pub fn new(kv: Arc<dyn KvBackend>, op_timeout: Duration) -> Self {
        Self { kv, op_timeout }
    }

    /// Bound a store call by the operation timeout.
    async fn bounded<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::store("Store operation timed out")),
        }
    }

    /// Store a record with the given TTL, overwriting any prior record
    /// for the same token.
    ///
    /// An `Err` means the record was not established; the caller must
    /// not treat the user as logged in.
    pub async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> AppResult<()> {
        let now = Utc::now();
        let record = TokenRecord {
            user_id,
            created_at: now,
            expires_at: now
                + chrono::Duration::from_std(ttl)
                    .map_err(|e| AppError::internal(format!("Token TTL out of range: {e}")))?,
        };
        let value = serde_json::to_string(&record)?;
        let key = keys::token_key(token);

        self.bounded(self.kv.set_ex(&key, &value, ttl)).await
    }

    /// Fetch the record for a token. Absent (or store-evicted) tokens
    /// are `None`; infrastructure failures propagate for the caller to
    /// fail closed.
    pub async fn get(&self, token: &str) -> AppResult<Option<TokenRecord>> {
        let key = keys::token_key(token);
        match self.bounded(self.kv.get(&key)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Whether a record exists and is not past its expiry.
    ///
    /// Any backend error reads as invalid (fail closed).
    pub async fn is_valid(&self, token: &str) -> bool {
        match self.get(token).await {
            Ok(Some(record)) => Utc::now() < record.expires_at,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Token lookup failed, treating token as invalid");
                false
            }
        }
    }

    /// Delete the record for a token. Idempotent; reports whether a
    /// record was actually removed.
    pub async fn delete(&self, token: &str) -> AppResult<bool> {
        let key = keys::token_key(token);
        self.bounded(self.kv.delete(&key)).await
    }

    /// List every live token belonging to a user.
    ///
    /// Full keyspace scan filtering on the embedded user ID: O(total
    /// active tokens), not O(user's tokens). No secondary index is
    /// maintained; callers must not assume O(1).
    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<UserToken>> {
        let pattern = keys::token_pattern();
        let found = self.bounded(self.kv.scan_keys(&pattern)).await?;

        let mut tokens = Vec::new();
        for key in found {
            let Some(token) = keys::token_from_key(&key) else {
                continue;
            };
            let Some(record) = self.get(token).await? else {
                continue;
            };
            if record.user_id == user_id {
                tokens.push(UserToken {
                    token: token.to_string(),
                    record,
                });
            }
        }
        Ok(tokens)
    }

    /// Revoke every token belonging to a user. Returns the number of
    /// records removed.
    ///
    /// Each delete is atomic for its key, but the scan-and-delete as a
    /// whole is not: a login racing this call may mint a token that
    /// survives, and callers must tolerate that.
    pub async fn revoke_all_for_user(&self, user_id: i64) -> AppResult<u64> {
        let tokens = self.list_for_user(user_id).await?;

        let mut revoked = 0u64;
        for user_token in &tokens {
            if self.delete(&user_token.token).await? {
                revoked += 1;
            }
        }

        debug!(user_id, revoked, "Revoked user tokens");
        Ok(revoked)
    }
}
