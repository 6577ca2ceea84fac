//! Authentication service orchestration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gatekeep_core::error::{AppError, ErrorKind};
use gatekeep_core::result::AppResult;
use gatekeep_core::traits::directory::UserDirectory;
use gatekeep_core::user::User;

use crate::password::PasswordHasher;
use crate::token::store::UserToken;
use crate::token::{Identity, IssuedToken, SessionIssuer};

/// An authenticated user's profile, safe to hand outward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// User ID.
    pub user_id: i64,
    /// Login name.
    pub login: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            login: user.login,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Orchestrates registration, login, logout, account deletion, and
/// request authentication.
///
/// Input constraints (length, character classes) are enforced by the
/// external request-validation layer; this service assumes
/// already-validated input.
#[derive(Debug, Clone)]
pub struct AuthService {
    /// External user table, behind the narrow lookup contract.
    directory: Arc<dyn UserDirectory>,
    /// Password hashing and verification.
    hasher: Arc<PasswordHasher>,
    /// Token minting and validation.
    issuer: Arc<SessionIssuer>,
}

impl AuthService {
    /// Create the service from its collaborators.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        hasher: PasswordHasher,
        issuer: SessionIssuer,
    ) -> Self {
        Self {
            directory,
            hasher: Arc::new(hasher),
            issuer: Arc::new(issuer),
        }
    }

    /// Register a new account and return its user ID.
    ///
    /// Fails with `DuplicateLogin` when the login is already taken.
    pub async fn register(&self, login: &str, password: &str) -> AppResult<i64> {
        let password_hash = self.hash_blocking(password.to_string()).await?;

        let user_id = self
            .directory
            .insert(login, &password_hash)
            .await
            .map_err(|e| fail_closed(e, "Registration could not be completed"))?;

        info!(user_id, login, "Registered new account");
        Ok(user_id)
    }

    /// Log in with credentials and mint a session token.
    ///
    /// An unknown login and a wrong password produce the identical
    /// `InvalidCredentials` outcome, so callers cannot enumerate
    /// accounts.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<IssuedToken> {
        let user = self.verify_credentials(login, password).await?;

        if let Err(e) = self.directory.touch_last_login(user.id).await {
            warn!(user_id = user.id, error = %e, "Failed to record last login");
        }

        let issued = self.issuer.issue(user.id, &user.login).await?;
        info!(user_id = user.id, "Login successful");
        Ok(issued)
    }

    /// Log out by deleting the token's store record.
    ///
    /// Logging out twice is not a failure; whether a record existed is
    /// not surfaced. A store failure is surfaced: the session may still
    /// be live.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.issuer
            .store()
            .delete(token)
            .await
            .map(|_existed| ())
            .map_err(|e| fail_closed(e, "Logout could not be completed"))
    }

    /// Delete an account after re-checking credentials, revoking every
    /// session first so no token outlives the account.
    pub async fn delete_account(&self, login: &str, password: &str) -> AppResult<()> {
        let user = self.verify_credentials(login, password).await?;

        let revoked = self
            .issuer
            .store()
            .revoke_all_for_user(user.id)
            .await
            .map_err(|e| fail_closed(e, "Account sessions could not be revoked"))?;

        self.directory
            .delete(user.id)
            .await
            .map_err(|e| fail_closed(e, "Account could not be deleted"))?;

        info!(user_id = user.id, revoked, "Account deleted");
        Ok(())
    }

    /// Authenticate a presented token and resolve its identity.
    ///
    /// The gate in front of any identity-requiring operation.
    pub async fn authenticate(&self, token: &str) -> AppResult<Identity> {
        self.issuer.validate(token).await
    }

    /// Look up the authenticated user's profile.
    pub async fn profile(&self, token: &str) -> AppResult<Profile> {
        let identity = self.authenticate(token).await?;

        let user = self
            .directory
            .find_by_id(identity.user_id)
            .await
            .map_err(|e| fail_closed(e, "Profile could not be loaded"))?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(Profile::from(user))
    }

    /// Replace the account password and revoke existing sessions.
    ///
    /// The credential is replaced wholesale; tokens minted under the
    /// old password do not survive the rotation.
    pub async fn change_password(
        &self,
        login: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.verify_credentials(login, old_password).await?;

        let new_hash = self.hash_blocking(new_password.to_string()).await?;
        self.directory
            .update_password(user.id, &new_hash)
            .await
            .map_err(|e| fail_closed(e, "Password could not be changed"))?;

        let revoked = self
            .issuer
            .store()
            .revoke_all_for_user(user.id)
            .await
            .map_err(|e| fail_closed(e, "Old sessions could not be revoked"))?;

        info!(user_id = user.id, revoked, "Password changed");
        Ok(())
    }

    /// List the authenticated user's active sessions.
    pub async fn sessions(&self, token: &str) -> AppResult<Vec<UserToken>> {
        let identity = self.authenticate(token).await?;

        self.issuer
            .store()
            .list_for_user(identity.user_id)
            .await
            .map_err(|e| fail_closed(e, "Sessions could not be listed"))
    }

    /// Look up and verify credentials with a uniform failure outcome.
    async fn verify_credentials(&self, login: &str, password: &str) -> AppResult<User> {
        let user = self
            .directory
            .find_by_login(login)
            .await
            .map_err(|e| fail_closed(e, "Login could not be completed"))?
            .ok_or_else(AppError::invalid_credentials)?;

        let verified = self
            .verify_blocking(password.to_string(), user.password_hash.clone())
            .await?;
        if !verified {
            return Err(AppError::invalid_credentials());
        }

        Ok(user)
    }

    /// Hash on a blocking thread; hashing is CPU-bound and must not
    /// stall the request dispatcher.
    async fn hash_blocking(&self, password: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
    }

    /// Verify on a blocking thread, for the same reason.
    async fn verify_blocking(&self, password: String, hash: String) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Verification task failed: {e}")))
    }
}

/// Fold an infrastructure failure into the fail-closed outward kind,
/// leaving domain kinds untouched.
fn fail_closed(e: AppError, outcome: &str) -> AppError {
    match e.kind {
        ErrorKind::InvalidCredentials
        | ErrorKind::DuplicateLogin
        | ErrorKind::TokenInvalid
        | ErrorKind::StoreUnavailable
        | ErrorKind::NotFound => e,
        _ => {
            warn!(error = %e, "Infrastructure failure");
            AppError::store_unavailable(outcome)
        }
    }
}
