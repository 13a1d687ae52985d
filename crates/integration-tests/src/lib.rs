//! Integration tests for the Am-Botanics storefront shell.
//!
//! The tests run the real client, session store and shell against
//! [`MockBackend`], an in-process axum server that mimics the storefront REST
//! API and counts what it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p am-botanics-integration-tests
//! ```
//!
//! # Endpoints
//!
//! ```text
//! POST /api/auth/login   - credentials below; unknown ones get 400 + message
//! GET  /api/auth/me      - bearer token → { user } or 401
//! GET  /api/products     - public catalogue
//! GET  /api/orders       - requires a valid bearer token
//! GET  /api/echo-auth    - echoes the Authorization header
//! GET  /api/slow         - answers after two seconds
//! GET  /api/broken       - 200 with a non-JSON body
//! GET  /api/fail         - 500 with a message
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use am_botanics_client::ApiClientConfig;
use am_botanics_storefront::StorefrontConfig;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

pub const ADMIN_EMAIL: &str = "owner@ambotanics.pk";
pub const ADMIN_PASSWORD: &str = "moringa-2024";
pub const ADMIN_TOKEN: &str = "admin-token";

pub const CUSTOMER_EMAIL: &str = "shopper@ambotanics.pk";
pub const CUSTOMER_PASSWORD: &str = "neem-soap";
pub const CUSTOMER_TOKEN: &str = "customer-token";

/// Rejected by `/api/auth/me` with a 401.
pub const EXPIRED_TOKEN: &str = "expired-token";

/// Logging in as this account fails with a bare 500.
pub const SILENT_FAILURE_EMAIL: &str = "crash@ambotanics.pk";

/// Message the mock sends for wrong credentials.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Sent the way Mongoose serializes with virtuals on: both `_id` and `id`.
#[must_use]
pub fn admin_user() -> Value {
    json!({
        "_id": "u-admin",
        "id": "u-admin",
        "role": "admin",
        "name": "Ayesha Khan",
        "email": ADMIN_EMAIL
    })
}

#[must_use]
pub fn customer_user() -> Value {
    json!({
        "_id": "u-shopper",
        "role": "customer",
        "name": "Bilal Ahmed",
        "email": CUSTOMER_EMAIL,
        "phone": "0300-1234567"
    })
}

#[must_use]
pub fn catalogue() -> Value {
    json!([
        {"_id": "p1", "name": "Moringa Face Cream"},
        {"_id": "p2", "name": "Charcoal Body Soap"}
    ])
}

#[derive(Default)]
struct MockState {
    sessions: Mutex<HashMap<String, Value>>,
    seen_auth: Mutex<Vec<(&'static str, Option<String>)>>,
    login_calls: AtomicUsize,
    me_calls: AtomicUsize,
    products_calls: AtomicUsize,
    login_delay: Mutex<Duration>,
    me_delay: Mutex<Duration>,
    products_fail: AtomicBool,
}

impl MockState {
    fn record(&self, path: &'static str, headers: &HeaderMap) -> Option<String> {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.seen_auth.lock().push((path, auth.clone()));
        auth
    }

    fn user_for(&self, auth: Option<&str>) -> Option<Value> {
        let token = auth?.strip_prefix("Bearer ")?;
        self.sessions.lock().get(token).cloned()
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<LoginBody>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *state.login_delay.lock();
    pause(delay).await;

    let (token, user) = match (body.email.as_str(), body.password.as_str()) {
        (ADMIN_EMAIL, ADMIN_PASSWORD) => (ADMIN_TOKEN, admin_user()),
        (CUSTOMER_EMAIL, CUSTOMER_PASSWORD) => (CUSTOMER_TOKEN, customer_user()),
        (SILENT_FAILURE_EMAIL, _) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": INVALID_CREDENTIALS })),
            )
                .into_response();
        }
    };

    state
        .sessions
        .lock()
        .insert(token.to_string(), user.clone());
    Json(json!({ "token": token, "user": user })).into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    let auth = state.record("/api/auth/me", &headers);
    let delay = *state.me_delay.lock();
    pause(delay).await;

    match state.user_for(auth.as_deref()) {
        Some(user) => Json(json!({ "user": user })).into_response(),
        None => unauthorized("Token expired"),
    }
}

async fn products(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.products_calls.fetch_add(1, Ordering::SeqCst);
    state.record("/api/products", &headers);
    if state.products_fail.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "Catalogue offline" })),
        )
            .into_response();
    }
    Json(catalogue()).into_response()
}

async fn orders(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let auth = state.record("/api/orders", &headers);
    if state.user_for(auth.as_deref()).is_none() {
        return unauthorized("Not authorized");
    }
    Json(json!([{ "_id": "o1", "status": "pending" }])).into_response()
}

async fn echo_auth(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    let auth = state.record("/api/echo-auth", &headers);
    Json(json!({ "authorization": auth }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "ok": true }))
}

async fn broken() -> Response {
    (StatusCode::OK, "<html>not json</html>").into_response()
}

async fn fail() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Database unavailable" })),
    )
        .into_response()
}

/// In-process stand-in for the storefront REST API.
pub struct MockBackend {
    base_url: Url,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        {
            let mut sessions = state.sessions.lock();
            sessions.insert(ADMIN_TOKEN.to_string(), admin_user());
            sessions.insert(CUSTOMER_TOKEN.to_string(), customer_user());
        }

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/products", get(products))
            .route("/api/orders", get(orders))
            .route("/api/echo-auth", get(echo_auth))
            .route("/api/slow", get(slow))
            .route("/api/broken", get(broken))
            .route("/api/fail", get(fail))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: base_url(addr),
            state,
            server,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn client_config(&self) -> ApiClientConfig {
        ApiClientConfig::new(self.base_url.clone())
    }

    /// Shell configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the generated configuration is invalid.
    #[must_use]
    pub fn shell_config(&self) -> StorefrontConfig {
        let base = self.base_url.to_string();
        StorefrontConfig::from_lookup(|key| (key == "AB_API_BASE_URL").then(|| base.clone()))
            .expect("Mock backend config is valid")
    }

    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.state.login_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn me_calls(&self) -> usize {
        self.state.me_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn products_calls(&self) -> usize {
        self.state.products_calls.load(Ordering::SeqCst)
    }

    /// `Authorization` headers received on `path`, in order.
    #[must_use]
    pub fn auth_headers(&self, path: &str) -> Vec<Option<String>> {
        self.state
            .seen_auth
            .lock()
            .iter()
            .filter(|(p, _)| *p == path)
            .map(|(_, auth)| auth.clone())
            .collect()
    }

    pub fn set_login_delay(&self, delay: Duration) {
        *self.state.login_delay.lock() = delay;
    }

    pub fn set_me_delay(&self, delay: Duration) {
        *self.state.me_delay.lock() = delay;
    }

    pub fn fail_products(&self, fail: bool) {
        self.state.products_fail.store(fail, Ordering::SeqCst);
    }

    /// Invalidate a token server-side.
    pub fn revoke(&self, token: &str) {
        self.state.sessions.lock().remove(token);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn base_url(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}")).expect("Socket address is a valid URL")
}

/// Address nothing is listening on.
///
/// # Panics
///
/// Panics if no ephemeral port can be reserved.
pub async fn closed_port_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to reserve port");
    let addr = listener.local_addr().expect("Listener has no address");
    drop(listener);
    base_url(addr)
}
