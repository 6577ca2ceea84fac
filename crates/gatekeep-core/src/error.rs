//! Unified application error types for Gatekeep.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The service boundary exposes only
//! the domain kinds; infrastructure kinds are converted into fail-closed
//! outcomes before they reach a caller.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Unknown login or wrong password. The two causes are never
    /// distinguished outward.
    InvalidCredentials,
    /// Registration attempted with a login that already exists.
    DuplicateLogin,
    /// A presented token failed validation (bad signature, expired,
    /// revoked, or the store could not confirm it).
    TokenInvalid,
    /// The backing store was unreachable and the operation did not
    /// complete.
    StoreUnavailable,
    /// The requested record was not found.
    NotFound,
    /// A key-value store error occurred.
    Store,
    /// A user directory error occurred.
    Directory,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::DuplicateLogin => write!(f, "DUPLICATE_LOGIN"),
            Self::TokenInvalid => write!(f, "TOKEN_INVALID"),
            Self::StoreUnavailable => write!(f, "STORE_UNAVAILABLE"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Store => write!(f, "STORE"),
            Self::Directory => write!(f, "DIRECTORY"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Gatekeep.
///
/// All crate-specific errors are mapped into `AppError` using `From`
/// impls or explicit `.map_err()` calls. This provides a single error
/// type for the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-credentials error.
    ///
    /// Takes no message: unknown-login and wrong-password failures must
    /// be byte-identical so callers cannot enumerate accounts.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid login or password")
    }

    /// Create a duplicate-login error.
    pub fn duplicate_login(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateLogin, message)
    }

    /// Create a token-invalid error.
    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenInvalid, message)
    }

    /// Create a store-unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_is_uniform() {
        let unknown_login = AppError::invalid_credentials();
        let wrong_password = AppError::invalid_credentials();
        assert_eq!(unknown_login.kind, wrong_password.kind);
        assert_eq!(unknown_login.to_string(), wrong_password.to_string());
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::token_invalid("Token has expired");
        assert_eq!(err.to_string(), "TOKEN_INVALID: Token has expired");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = AppError::with_source(ErrorKind::Store, "Redis error", io);
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Store);
        assert!(cloned.source.is_none());
    }
}
