//! Integration tests for the authenticated HTTP client.
//!
//! Every test starts its own mock backend; nothing external is required.

use std::sync::Arc;
use std::time::Duration;

use am_botanics_client::{ApiClient, ApiClientConfig, ErrorKind, MemoryTokenStore, TokenStore};
use am_botanics_core::TokenSlot;
use am_botanics_integration_tests::{
    ADMIN_TOKEN, CUSTOMER_TOKEN, EXPIRED_TOKEN, MockBackend, closed_port_url,
};
use am_botanics_storefront::{History, Navigator, PRODUCTS_PATH, Shell};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

fn client_with(backend: &MockBackend, tokens: Arc<MemoryTokenStore>) -> ApiClient {
    ApiClient::new(backend.client_config(), tokens).expect("Failed to build client")
}

fn both_slots(admin: &str, customer: &str) -> Arc<MemoryTokenStore> {
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, admin));
    tokens
        .set(TokenSlot::Customer, SecretString::from(customer.to_string()))
        .expect("Memory store never fails");
    tokens
}

// ============================================================================
// Token attachment
// ============================================================================

#[tokio::test]
async fn test_admin_token_preferred_over_customer_token() {
    let backend = MockBackend::start().await;
    let client = client_with(&backend, both_slots(ADMIN_TOKEN, CUSTOMER_TOKEN));

    let body: Value = client.get("/api/echo-auth").await.expect("Request failed");

    assert_eq!(body["authorization"], format!("Bearer {ADMIN_TOKEN}"));
}

#[tokio::test]
async fn test_customer_token_used_when_admin_slot_empty() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Customer, CUSTOMER_TOKEN));
    let client = client_with(&backend, tokens);

    let body: Value = client.get("/api/echo-auth").await.expect("Request failed");

    assert_eq!(body["authorization"], format!("Bearer {CUSTOMER_TOKEN}"));
}

#[tokio::test]
async fn test_no_header_without_token() {
    let backend = MockBackend::start().await;
    let client = client_with(&backend, Arc::new(MemoryTokenStore::new()));

    let body: Value = client.get("/api/echo-auth").await.expect("Request failed");

    assert!(body["authorization"].is_null());
    assert_eq!(backend.auth_headers("/api/echo-auth"), vec![None]);
}

#[tokio::test]
async fn test_public_request_omits_stored_token() {
    let backend = MockBackend::start().await;
    let client = client_with(&backend, both_slots(ADMIN_TOKEN, CUSTOMER_TOKEN));

    let products = client
        .get_public_json(PRODUCTS_PATH)
        .await
        .expect("Products request failed");

    assert!(products.is_array());
    assert_eq!(backend.auth_headers(PRODUCTS_PATH), vec![None]);
}

// ============================================================================
// 401 handling
// ============================================================================

#[tokio::test]
async fn test_unauthorized_clears_both_slots_and_redirects_once() {
    let backend = MockBackend::start().await;
    let tokens = both_slots(EXPIRED_TOKEN, CUSTOMER_TOKEN);
    let history = Arc::new(History::starting_at("/orders"));
    let shell = Shell::new(backend.shell_config(), tokens.clone(), history.clone())
        .expect("Failed to build shell");

    let err = shell
        .client()
        .get_json_value("/api/orders")
        .await
        .expect_err("Expired token must be rejected");

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(tokens.get(TokenSlot::Admin).is_none());
    assert!(tokens.get(TokenSlot::Customer).is_none());
    assert_eq!(history.entries(), vec!["/orders", "/auth"]);
    assert!(!shell.session().snapshot().is_authenticated());
    assert!(!shell.session().snapshot().loading());
}

#[tokio::test]
async fn test_unauthorized_on_login_route_does_not_navigate() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, EXPIRED_TOKEN));
    let history = Arc::new(History::starting_at("/auth"));
    let shell = Shell::new(backend.shell_config(), tokens.clone(), history.clone())
        .expect("Failed to build shell");

    let err = shell
        .client()
        .get_json_value("/api/orders")
        .await
        .expect_err("Expired token must be rejected");

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(tokens.get(TokenSlot::Admin).is_none());
    assert_eq!(history.entries(), vec!["/auth"]);
    assert_eq!(history.current_path(), "/auth");
}

#[tokio::test]
async fn test_unauthorized_without_token_still_redirects() {
    let backend = MockBackend::start().await;
    let history = Arc::new(History::starting_at("/admin/orders"));
    let shell = Shell::new(
        backend.shell_config(),
        Arc::new(MemoryTokenStore::new()),
        history.clone(),
    )
    .expect("Failed to build shell");

    let err = shell
        .client()
        .get_json_value("/api/orders")
        .await
        .expect_err("Anonymous request must be rejected");

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(history.current_path(), "/auth");
}

#[tokio::test]
async fn test_valid_token_survives_protected_request() {
    let backend = MockBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token(TokenSlot::Admin, ADMIN_TOKEN));
    let client = client_with(&backend, tokens.clone());

    let orders = client.get_json_value("/api/orders").await.expect("Orders failed");

    assert_eq!(orders[0]["status"], "pending");
    let kept = tokens.get(TokenSlot::Admin).expect("Token must be kept");
    assert_eq!(kept.expose_secret(), ADMIN_TOKEN);
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn test_slow_response_times_out() {
    let backend = MockBackend::start().await;
    let config = backend
        .client_config()
        .with_timeout(Duration::from_millis(200));
    let client = ApiClient::new(config, Arc::new(MemoryTokenStore::new()))
        .expect("Failed to build client");

    let err = client
        .get_json_value("/api/slow")
        .await
        .expect_err("Request must time out");

    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_server_error_keeps_message() {
    let backend = MockBackend::start().await;
    let client = client_with(&backend, Arc::new(MemoryTokenStore::new()));

    let err = client
        .get_json_value("/api/fail")
        .await
        .expect_err("Request must fail");

    assert_eq!(err.kind(), ErrorKind::ServerRejected);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(err.server_message().as_deref(), Some("Database unavailable"));
}

#[tokio::test]
async fn test_non_json_success_is_malformed() {
    let backend = MockBackend::start().await;
    let client = client_with(&backend, Arc::new(MemoryTokenStore::new()));

    let err = client
        .get_json_value("/api/broken")
        .await
        .expect_err("Body must not decode");

    assert_eq!(err.kind(), ErrorKind::MalformedBody);
    assert_eq!(err.body(), Some("<html>not json</html>"));
}

#[tokio::test]
async fn test_connection_refused_is_network_failure() {
    let url = closed_port_url().await;
    let client = ApiClient::new(ApiClientConfig::new(url), Arc::new(MemoryTokenStore::new()))
        .expect("Failed to build client");

    let err = client
        .get_json_value("/api/products")
        .await
        .expect_err("Nothing is listening");

    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
}
