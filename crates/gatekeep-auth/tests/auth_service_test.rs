//! Integration tests for the full credential/session flow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use gatekeep_auth::password::PasswordHasher;
use gatekeep_auth::service::AuthService;
use gatekeep_auth::token::{SessionIssuer, TokenStore};
use gatekeep_core::config::AppConfig;
use gatekeep_core::error::{AppError, ErrorKind};
use gatekeep_core::result::AppResult;
use gatekeep_core::traits::directory::UserDirectory;
use gatekeep_core::traits::kv::KvBackend;
use gatekeep_store::{MemoryDirectory, MemoryKvStore, StoreManager};

/// A backend whose every operation fails, simulating a store outage.
#[derive(Debug)]
struct FailingKv;

#[async_trait]
impl KvBackend for FailingKv {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(AppError::store("Connection refused"))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        Err(AppError::store("Connection refused"))
    }

    async fn delete(&self, _key: &str) -> AppResult<bool> {
        Err(AppError::store("Connection refused"))
    }

    async fn scan_keys(&self, _pattern: &str) -> AppResult<Vec<String>> {
        Err(AppError::store("Connection refused"))
    }

    async fn exists(&self, _key: &str) -> AppResult<bool> {
        Err(AppError::store("Connection refused"))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(false)
    }
}

struct TestHarness {
    service: AuthService,
    directory: Arc<MemoryDirectory>,
    kv: Arc<MemoryKvStore>,
    config: AppConfig,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fast hashing parameters so the suite stays quick.
fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.secret = "integration-test-secret".to_string();
    config.auth.hash_memory_kib = 1024;
    config.auth.hash_iterations = 1;
    config
}

fn make_harness() -> TestHarness {
    init_tracing();
    let config = test_config();
    let directory = Arc::new(MemoryDirectory::new());
    let kv = Arc::new(MemoryKvStore::new());

    let manager = StoreManager::from_backend(kv.clone());
    let store = TokenStore::new(
        Arc::new(manager),
        Duration::from_millis(config.store.op_timeout_ms),
    );
    let issuer = SessionIssuer::new(&config.auth, store);
    let hasher = PasswordHasher::new(&config.auth).unwrap();
    let service = AuthService::new(directory.clone(), hasher, issuer);

    TestHarness {
        service,
        directory,
        kv,
        config,
    }
}

/// A service wired to a dead store but sharing the harness's secret
/// and user directory.
fn make_outage_service(harness: &TestHarness) -> AuthService {
    let store = TokenStore::new(
        Arc::new(FailingKv),
        Duration::from_millis(harness.config.store.op_timeout_ms),
    );
    let issuer = SessionIssuer::new(&harness.config.auth, store);
    let hasher = PasswordHasher::new(&harness.config.auth).unwrap();
    AuthService::new(harness.directory.clone(), hasher, issuer)
}

#[tokio::test]
async fn test_register_login_authenticate_logout_flow() {
    let harness = make_harness();

    let user_id = harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();
    assert_eq!(user_id, 1);

    let issued = harness.service.login("alice", "Secret123").await.unwrap();
    let identity = harness.service.authenticate(&issued.token).await.unwrap();
    assert_eq!(identity.user_id, 1);
    assert_eq!(identity.login, "alice");

    harness.service.logout(&issued.token).await.unwrap();
    let err = harness
        .service
        .authenticate(&issued.token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenInvalid);

    // Logging out twice is not a failure.
    harness.service.logout(&issued.token).await.unwrap();
}

#[tokio::test]
async fn test_delete_account_revokes_every_session() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();

    let first = harness.service.login("alice", "Secret123").await.unwrap();
    let second = harness.service.login("alice", "Secret123").await.unwrap();
    assert_ne!(first.token, second.token);

    harness
        .service
        .delete_account("alice", "Secret123")
        .await
        .unwrap();

    for token in [&first.token, &second.token] {
        let err = harness.service.authenticate(token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenInvalid);
    }

    // The account is gone; a fresh login reads as bad credentials.
    let err = harness
        .service
        .login("alice", "Secret123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn test_invalid_credentials_are_indistinguishable() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();

    let wrong_password = harness
        .service
        .login("alice", "WrongPassword1")
        .await
        .unwrap_err();
    let unknown_login = harness
        .service
        .login("mallory", "Secret123")
        .await
        .unwrap_err();

    assert_eq!(wrong_password.kind, ErrorKind::InvalidCredentials);
    assert_eq!(unknown_login.kind, ErrorKind::InvalidCredentials);
    // Same kind and the same message bytes: no account enumeration.
    assert_eq!(wrong_password.to_string(), unknown_login.to_string());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();

    let err = harness
        .service
        .register("alice", "Other456")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateLogin);
}

#[tokio::test]
async fn test_token_expires_after_ttl() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();

    // Issue directly with a short TTL against the same store; both the
    // signed expiry and the store record elapse.
    let store = TokenStore::new(
        harness.kv.clone(),
        Duration::from_millis(harness.config.store.op_timeout_ms),
    );
    let issuer = SessionIssuer::new(&harness.config.auth, store);
    let issued = issuer
        .issue_with_ttl(1, "alice", Duration::from_millis(1500))
        .await
        .unwrap();

    harness.service.authenticate(&issued.token).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2100)).await;
    let err = harness
        .service
        .authenticate(&issued.token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenInvalid);
}

#[tokio::test]
async fn test_store_outage_fails_issuance_closed() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();

    let outage = make_outage_service(&harness);
    let err = outage.login("alice", "Secret123").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreUnavailable);
}

#[tokio::test]
async fn test_store_outage_fails_validation_closed() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();
    let issued = harness.service.login("alice", "Secret123").await.unwrap();

    // The signature still verifies, but the store cannot confirm the
    // record: validation degrades to an invalid token, never an error.
    let outage = make_outage_service(&harness);
    let err = outage.authenticate(&issued.token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenInvalid);
}

#[tokio::test]
async fn test_revocation_is_scoped_to_one_user() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();
    harness.service.register("bob", "Hunter456").await.unwrap();

    let alice_token = harness.service.login("alice", "Secret123").await.unwrap();
    let bob_token = harness.service.login("bob", "Hunter456").await.unwrap();

    harness
        .service
        .delete_account("alice", "Secret123")
        .await
        .unwrap();

    let err = harness
        .service
        .authenticate(&alice_token.token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenInvalid);

    let identity = harness
        .service
        .authenticate(&bob_token.token)
        .await
        .unwrap();
    assert_eq!(identity.login, "bob");
}

#[tokio::test]
async fn test_change_password_rotates_credential_and_sessions() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();
    let issued = harness.service.login("alice", "Secret123").await.unwrap();

    harness
        .service
        .change_password("alice", "Secret123", "Rotated789")
        .await
        .unwrap();

    // Pre-rotation sessions are gone.
    let err = harness
        .service
        .authenticate(&issued.token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenInvalid);

    // The old password no longer works; the new one does.
    let err = harness
        .service
        .login("alice", "Secret123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    harness.service.login("alice", "Rotated789").await.unwrap();
}

#[tokio::test]
async fn test_profile_resolves_authenticated_user() {
    let harness = make_harness();
    let user_id = harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();
    let issued = harness.service.login("alice", "Secret123").await.unwrap();

    let profile = harness.service.profile(&issued.token).await.unwrap();
    assert_eq!(profile.user_id, user_id);
    assert_eq!(profile.login, "alice");
    assert!(profile.last_login_at.is_some());

    // A valid token whose user vanished underneath is a not-found,
    // not an invalid token.
    harness.directory.delete(user_id).await.unwrap();
    let err = harness.service.profile(&issued.token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_sessions_lists_only_own_tokens() {
    let harness = make_harness();
    harness
        .service
        .register("alice", "Secret123")
        .await
        .unwrap();
    harness.service.register("bob", "Hunter456").await.unwrap();

    let first = harness.service.login("alice", "Secret123").await.unwrap();
    let second = harness.service.login("alice", "Secret123").await.unwrap();
    harness.service.login("bob", "Hunter456").await.unwrap();

    let sessions = harness.service.sessions(&first.token).await.unwrap();
    assert_eq!(sessions.len(), 2);

    let mut tokens: Vec<_> = sessions.iter().map(|s| s.token.clone()).collect();
    tokens.sort();
    let mut expected = vec![first.token.clone(), second.token.clone()];
    expected.sort();
    assert_eq!(tokens, expected);
}
