//! Signed token issuance and validation.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};
use uuid::Uuid;

use gatekeep_core::config::auth::AuthConfig;
use gatekeep_core::error::AppError;
use gatekeep_core::result::AppResult;

use super::claims::{Claims, Identity};
use super::store::TokenStore;

/// A freshly issued session token.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedToken {
    /// The bearer token string.
    pub token: String,
    /// When it expires.
    pub expires_at: chrono::DateTime<Utc>,
}

/// Mints signed session tokens and validates presented ones.
///
/// A token is valid only while its signature verifies, its signed
/// expiry lies ahead, **and** its store record exists; any one failing
/// invalidates it. Revocation therefore works even though the
/// signature alone would still verify.
pub struct SessionIssuer {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
    /// Revocable record store.
    store: TokenStore,
    /// Default TTL for issued tokens.
    token_ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("validation", &self.validation)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl SessionIssuer {
    /// Create an issuer from auth configuration.
    pub fn new(config: &AuthConfig, store: TokenStore) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry runs as its own ordered step, exactly and with no leeway.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            store,
            token_ttl: Duration::from_secs(config.token_ttl_hours * 3600),
        }
    }

    /// The token store this issuer registers tokens in.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Issue a token with the configured default TTL.
    pub async fn issue(&self, user_id: i64, login: &str) -> AppResult<IssuedToken> {
        self.issue_with_ttl(user_id, login, self.token_ttl).await
    }

    /// Issue a token with an explicit TTL and register it in the store.
    ///
    /// The signed token is never handed out without its store record: a
    /// failed store write fails issuance as a whole, keeping revocation
    /// effective.
    pub async fn issue_with_ttl(
        &self,
        user_id: i64,
        login: &str,
        ttl: Duration,
    ) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now
            + chrono::Duration::from_std(ttl)
                .map_err(|e| AppError::internal(format!("Token TTL out of range: {e}")))?;

        let claims = Claims {
            sub: user_id,
            login: login.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        if let Err(e) = self.store.put(&token, user_id, ttl).await {
            warn!(user_id, error = %e, "Store write failed, aborting issuance");
            return Err(AppError::store_unavailable(
                "Session could not be established",
            ));
        }

        debug!(user_id, %expires_at, "Issued session token");
        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a presented token and return the identity it asserts.
    ///
    /// Checks run cheapest first and short-circuit: (1) signature and
    /// payload decode, (2) signed expiry, (3) store membership. A flood
    /// of forged or stale tokens is rejected without a store round
    /// trip. Store errors and timeouts read as invalid (fail closed).
    pub async fn validate(&self, token: &str) -> AppResult<Identity> {
        let claims = self.decode(token)?;

        if claims.is_expired() {
            return Err(AppError::token_invalid("Token has expired"));
        }

        if !self.store.is_valid(token).await {
            return Err(AppError::token_invalid("Token has been revoked or expired"));
        }

        Ok(claims.identity())
    }

    /// Decode and verify the signed payload without touching the store.
    fn decode(&self, token: &str) -> AppResult<Claims> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::token_invalid("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::token_invalid("Invalid token signature")
                    }
                    _ => AppError::token_invalid(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}
