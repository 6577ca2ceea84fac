//! User entity shared with the external user directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account as stored by the external user table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Unique login name.
    pub login: String,
    /// Salted password hash (PHC string). Never logged or serialized
    /// outward; replaced wholesale on password change.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}
