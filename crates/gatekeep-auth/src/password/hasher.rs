//! Argon2id password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tracing::warn;

use gatekeep_core::config::auth::AuthConfig;
use gatekeep_core::error::AppError;
use gatekeep_core::result::AppResult;

/// Handles password hashing and verification using Argon2id.
///
/// Cost parameters come from configuration so a deployment can raise
/// the work factor without code changes.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    /// Argon2 cost parameters.
    params: Params,
}

impl PasswordHasher {
    /// Create a hasher with the configured cost parameters.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
            None,
        )
        .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a freshly generated random salt.
    ///
    /// The output is a PHC string embedding the algorithm identifier,
    /// parameters, and salt, so hashing the same password twice yields
    /// two different strings that both verify it. The empty password
    /// is legal input.
    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// Returns `true` iff `password` produced `hash`. The re-derived
    /// hash is compared in constant time. A malformed or foreign
    /// stored hash, and any verifier error, return `false` — a
    /// corrupted hash must never match or crash the caller.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                warn!(error = %e, "Password verification failed");
                false
            }
        }
    }
}
