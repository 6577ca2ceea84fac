//! Key builders for everything Gatekeep keeps in the key-value store.
//!
//! Centralising key construction prevents typos and makes it easy to
//! find every key the service uses.

/// Prefix for session token records.
const TOKEN_PREFIX: &str = "token:";

/// Key for a session token record.
pub fn token_key(token: &str) -> String {
    format!("{TOKEN_PREFIX}{token}")
}

/// Pattern matching every session token record.
pub fn token_pattern() -> String {
    format!("{TOKEN_PREFIX}*")
}

/// Extract the token string back out of a store key.
pub fn token_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(TOKEN_PREFIX)
}
