//! Integration tests for login, logout and session rehydration.

use std::sync::Arc;
use std::time::Duration;

use am_botanics_client::{
    ApiClient, ErrorKind, FileTokenStore, LoginFailure, MemoryTokenStore, SessionState,
    SessionStore, TokenStore,
};
use am_botanics_core::TokenSlot;
use am_botanics_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, ADMIN_TOKEN, CUSTOMER_EMAIL, CUSTOMER_PASSWORD, CUSTOMER_TOKEN,
    EXPIRED_TOKEN, INVALID_CREDENTIALS, MockBackend, SILENT_FAILURE_EMAIL,
};
use secrecy::{ExposeSecret, SecretString};

fn store(backend: &MockBackend, tokens: Arc<dyn TokenStore>) -> SessionStore {
    let client = ApiClient::new(backend.client_config(), tokens).expect("Failed to build client");
    SessionStore::new(client)
}

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn user_name(session: &SessionStore) -> Option<String> {
    session.snapshot().user().and_then(|u| u.name.clone())
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_persists_token_and_authenticates() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let session = store(&backend, tokens.clone());

    let user = session
        .login(ADMIN_EMAIL, password(ADMIN_PASSWORD))
        .await
        .expect("Login failed");

    assert!(user.is_admin());
    assert_eq!(user.id.as_str(), "u-admin");
    assert!(session.is_admin());
    assert_eq!(user_name(&session).as_deref(), Some("Ayesha Khan"));
    let stored = tokens.get(TokenSlot::Admin).expect("Token must be stored");
    assert_eq!(stored.expose_secret(), ADMIN_TOKEN);
}

#[tokio::test]
async fn test_login_rejected_with_server_message() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let session = store(&backend, tokens.clone());
    session.rehydrate().await;
    let before = session.snapshot();

    let failure = session
        .login(ADMIN_EMAIL, password("wrong"))
        .await
        .expect_err("Wrong password must fail");

    assert_eq!(failure.message, INVALID_CREDENTIALS);
    assert_eq!(failure.kind, Some(ErrorKind::ServerRejected));
    assert_eq!(session.snapshot(), before);
    assert!(tokens.get(TokenSlot::Admin).is_none());
}

#[tokio::test]
async fn test_login_without_server_message_uses_fallback() {
    let backend = MockBackend::start().await;
    let session = store(&backend, Arc::new(MemoryTokenStore::new()));

    let failure = session
        .login(SILENT_FAILURE_EMAIL, password("anything"))
        .await
        .expect_err("Server error must fail");

    assert_eq!(failure.message, LoginFailure::FALLBACK_MESSAGE);
    assert_eq!(failure.kind, Some(ErrorKind::ServerRejected));
}

#[tokio::test]
async fn test_malformed_email_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let session = store(&backend, Arc::new(MemoryTokenStore::new()));

    let failure = session
        .login("not-an-email", password(ADMIN_PASSWORD))
        .await
        .expect_err("Malformed email must fail");

    assert_eq!(failure.kind, Some(ErrorKind::ValidationFailure));
    assert_eq!(backend.login_calls(), 0);
}

#[tokio::test]
async fn test_customer_login_is_not_admin() {
    let backend = MockBackend::start().await;
    let session = store(&backend, Arc::new(MemoryTokenStore::new()));

    let user = session
        .login(CUSTOMER_EMAIL, password(CUSTOMER_PASSWORD))
        .await
        .expect("Login failed");

    assert!(!user.is_admin());
    assert!(session.snapshot().is_authenticated());
    assert!(!session.is_admin());
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_is_local() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let session = store(&backend, tokens.clone());
    session
        .login(ADMIN_EMAIL, password(ADMIN_PASSWORD))
        .await
        .expect("Login failed");
    let calls_before = backend.me_calls() + backend.login_calls();

    session.logout();

    assert_eq!(session.snapshot().state, SessionState::Anonymous);
    assert!(tokens.get(TokenSlot::Admin).is_none());
    assert_eq!(backend.me_calls() + backend.login_calls(), calls_before);
}

// ============================================================================
// Rehydration
// ============================================================================

#[tokio::test]
async fn test_rehydrate_without_token_skips_network() {
    let backend = MockBackend::start().await;
    let session = store(&backend, Arc::new(MemoryTokenStore::new()));
    assert!(session.snapshot().loading());

    let snapshot = session.rehydrate().await;

    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert_eq!(backend.me_calls(), 0);
}

#[tokio::test]
async fn test_rehydrate_with_valid_token() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, ADMIN_TOKEN));
    let session = store(&backend, tokens);

    session.start();
    let snapshot = session.wait_until_settled().await;

    assert!(snapshot.is_admin());
    assert_eq!(snapshot.user().map(|u| u.id.as_str()), Some("u-admin"));
    assert_eq!(backend.me_calls(), 1);
    assert_eq!(
        backend.auth_headers("/api/auth/me"),
        vec![Some(format!("Bearer {ADMIN_TOKEN}"))]
    );
}

#[tokio::test]
async fn test_rehydrate_keeps_token_when_user_has_both_ids() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, ADMIN_TOKEN));
    let session = store(&backend, tokens.clone());

    let snapshot = session.rehydrate().await;

    assert!(snapshot.is_admin());
    let kept = tokens.get(TokenSlot::Admin).expect("Token must be kept");
    assert_eq!(kept.expose_secret(), ADMIN_TOKEN);
}

#[tokio::test]
async fn test_customer_token_alone_is_not_rehydrated() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Customer, CUSTOMER_TOKEN));
    let session = store(&backend, tokens.clone());

    session.start();
    let snapshot = session.wait_until_settled().await;

    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert_eq!(backend.me_calls(), 0);
    let kept = tokens.get(TokenSlot::Customer).expect("Customer token must be kept");
    assert_eq!(kept.expose_secret(), CUSTOMER_TOKEN);
}

#[tokio::test]
async fn test_expired_token_cleared_at_startup() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, EXPIRED_TOKEN));
    let session = store(&backend, tokens.clone());

    let snapshot = session.rehydrate().await;

    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert_eq!(backend.me_calls(), 1);
    assert!(tokens.get(TokenSlot::Admin).is_none());
}

#[tokio::test]
async fn test_revoked_token_cleared_at_startup() {
    let backend = MockBackend::start().await;
    backend.revoke(ADMIN_TOKEN);
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, ADMIN_TOKEN));
    let session = store(&backend, tokens.clone());

    let snapshot = session.rehydrate().await;

    assert!(!snapshot.is_authenticated());
    assert!(tokens.get(TokenSlot::Admin).is_none());
}

#[tokio::test]
async fn test_session_survives_restart_with_file_store() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tokens.json");

    let first = store(&backend, Arc::new(FileTokenStore::new(&path)));
    first
        .login(ADMIN_EMAIL, password(ADMIN_PASSWORD))
        .await
        .expect("Login failed");
    drop(first);

    let second = store(&backend, Arc::new(FileTokenStore::new(&path)));
    let snapshot = second.rehydrate().await;

    assert!(snapshot.is_admin());
    assert_eq!(backend.me_calls(), 1);
}

// ============================================================================
// Login racing rehydration
// ============================================================================

#[tokio::test]
async fn test_rehydration_resolving_last_wins() {
    let backend = MockBackend::start().await;
    backend.set_me_delay(Duration::from_millis(300));
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, ADMIN_TOKEN));
    let session = store(&backend, tokens.clone());

    let (rehydrated, login) = tokio::join!(
        session.rehydrate(),
        session.login(CUSTOMER_EMAIL, password(CUSTOMER_PASSWORD)),
    );
    login.expect("Login failed");

    assert!(rehydrated.is_admin());
    let user = session.snapshot().user().cloned().expect("Session must be set");
    assert_eq!(user.name.as_deref(), Some("Ayesha Khan"));
    assert!(!user.profile.contains_key("phone"));
    // The login's token stays in the slot; the next /me call settles it.
    let stored = tokens.get(TokenSlot::Admin).expect("Token must be stored");
    assert_eq!(stored.expose_secret(), CUSTOMER_TOKEN);
}

#[tokio::test]
async fn test_login_resolving_last_wins() {
    let backend = MockBackend::start().await;
    backend.set_login_delay(Duration::from_millis(300));
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, ADMIN_TOKEN));
    let session = store(&backend, tokens.clone());

    let (_, login) = tokio::join!(
        session.rehydrate(),
        session.login(CUSTOMER_EMAIL, password(CUSTOMER_PASSWORD)),
    );
    login.expect("Login failed");

    let user = session.snapshot().user().cloned().expect("Session must be set");
    assert_eq!(user.name.as_deref(), Some("Bilal Ahmed"));
    assert!(!user.is_admin());
    let stored = tokens.get(TokenSlot::Admin).expect("Token must be stored");
    assert_eq!(stored.expose_secret(), CUSTOMER_TOKEN);
}
