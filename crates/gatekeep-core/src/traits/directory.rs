//! User-lookup collaborator contract.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::user::User;

/// Narrow contract over the external user table.
///
/// The relational implementation (connection pooling, transactions,
/// schema) lives outside this workspace; Gatekeep consumes accounts
/// only through this trait. Errors are infrastructure failures
/// ([`ErrorKind::Directory`](crate::error::ErrorKind)) except where a
/// method documents a domain kind.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Find an account by login name.
    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>>;

    /// Find an account by id.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Insert a new account and return its id.
    ///
    /// Fails with [`ErrorKind::DuplicateLogin`](crate::error::ErrorKind)
    /// when the login is already taken.
    async fn insert(&self, login: &str, password_hash: &str) -> AppResult<i64>;

    /// Replace the stored password hash wholesale. Returns whether the
    /// account existed.
    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool>;

    /// Record a successful login time.
    async fn touch_last_login(&self, id: i64) -> AppResult<()>;

    /// Delete an account. Returns whether a record was removed.
    async fn delete(&self, id: i64) -> AppResult<bool>;
}
