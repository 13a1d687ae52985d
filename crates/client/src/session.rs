//! Session store: who is logged in, and whether we know yet.
//!
//! # State machine
//!
//! ```text
//!             start() / rehydrate()
//!   Unknown ──────────────────────────┬──► Authenticated(user)
//!  (loading)        /api/auth/me ok   │
//!                                     └──► Anonymous
//!                   no token, or /me failed (token removed)
//!
//!   any state ── login() ok ──► Authenticated(user)   (token → adminToken)
//!   any state ── logout()   ──► Anonymous             (adminToken removed)
//!   any state ── 401 seen by the client ──► Anonymous
//! ```
//!
//! Rehydration and login are not serialized: whichever completes last
//! decides the final state. Every transition replaces the whole snapshot,
//! so nothing from an earlier user survives a later commit.
//!
//! Only the snapshot is last-write-wins. The admin slot always holds the
//! token from the most recent successful login, so when a slow rehydration
//! lands after a login the session shows the rehydrated user while requests
//! carry the new login's token. The next `401` or rehydration reconciles the
//! two.

use std::future::Future;
use std::sync::{Arc, Weak};

use am_botanics_core::{Email, SessionUser, TokenSlot};
use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::auth::{LOGIN_PATH, LoginResponse};
use crate::error::{ApiError, ErrorKind};
use crate::http::{ApiClient, UnauthorizedEvent};

/// Authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup rehydration has not finished.
    Unknown,
    /// A user is logged in.
    Authenticated(SessionUser),
    /// Nobody is logged in.
    Anonymous,
}

/// Point-in-time view of the session published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Current state.
    pub state: SessionState,
    /// Incremented on every committed transition.
    pub revision: u64,
}

impl SessionSnapshot {
    const fn initial() -> Self {
        Self {
            state: SessionState::Unknown,
            revision: 0,
        }
    }

    /// `true` until the first transition out of [`SessionState::Unknown`].
    #[must_use]
    pub const fn loading(&self) -> bool {
        matches!(self.state, SessionState::Unknown)
    }

    /// Logged-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Unknown | SessionState::Anonymous => None,
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Logged in with the `admin` role. Derived from this snapshot only.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(SessionUser::is_admin)
    }

    /// Short state name for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.state {
            SessionState::Unknown => "unknown",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Anonymous => "anonymous",
        }
    }
}

/// A login attempt that did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoginFailure {
    /// User-displayable message.
    pub message: String,
    /// Classification of the underlying API error; `None` when the server
    /// accepted the credentials but the token could not be persisted.
    pub kind: Option<ErrorKind>,
}

impl LoginFailure {
    /// Shown when the server gives no message of its own.
    pub const FALLBACK_MESSAGE: &'static str = "Login failed";

    fn from_api(err: &ApiError) -> Self {
        let message = match err {
            ApiError::Validation(msg) => msg.clone(),
            other => other
                .server_message()
                .unwrap_or_else(|| Self::FALLBACK_MESSAGE.to_string()),
        };
        Self {
            message,
            kind: Some(err.kind()),
        }
    }
}

/// Holds the current session and publishes every change.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionInner {
    fn commit(&self, state: SessionState, reason: &'static str) {
        let mut committed = SessionSnapshot::initial();
        self.state.send_modify(|snapshot| {
            snapshot.revision += 1;
            snapshot.state = state;
            committed = snapshot.clone();
        });
        info!(
            state = committed.label(),
            revision = committed.revision,
            user_id = committed.user().map(|u| u.id.as_str()),
            reason,
            "Session state changed"
        );
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("snapshot", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store in the `Unknown` state and subscribe it to the
    /// client's `401` notifications.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::initial());
        let inner = Arc::new(SessionInner {
            client: client.clone(),
            state,
        });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        client.add_unauthorized_handler(move |event: &UnauthorizedEvent| {
            // Bad credentials on the login form are not a session expiry.
            if event.path == LOGIN_PATH {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.commit(SessionState::Anonymous, "unauthorized response");
            }
        });

        Self { inner }
    }

    /// Client the store talks through.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Whether the current session is an admin session.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().is_admin()
    }

    /// Kick off rehydration in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            store.rehydrate().await;
        })
    }

    /// Rebuild the session from the persisted admin token.
    ///
    /// Without a token this settles to `Anonymous` without touching the
    /// network. With one, `/api/auth/me` decides; on any failure the token
    /// is removed.
    pub async fn rehydrate(&self) -> SessionSnapshot {
        let tokens = self.inner.client.tokens();
        if tokens.get(TokenSlot::Admin).is_none() {
            debug!("No persisted token; skipping rehydration");
            self.inner
                .commit(SessionState::Anonymous, "no persisted token");
            return self.snapshot();
        }

        match self.inner.client.me().await {
            Ok(user) => {
                self.inner
                    .commit(SessionState::Authenticated(user), "rehydrated");
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Session rehydration failed");
                if let Err(e) = tokens.remove(TokenSlot::Admin) {
                    warn!(error = %e, "Failed to remove rejected token");
                }
                self.inner
                    .commit(SessionState::Anonymous, "rehydration failed");
            }
        }
        self.snapshot()
    }

    /// Wait until the state is no longer `Unknown`.
    pub async fn wait_until_settled(&self) -> SessionSnapshot {
        let mut rx = self.subscribe();
        match rx.wait_for(|snapshot| !snapshot.loading()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Log in with email and password.
    ///
    /// On success the token is persisted in the admin slot and the store
    /// becomes `Authenticated`. On failure the state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`LoginFailure`] carrying the server's message when it sent
    /// one, otherwise [`LoginFailure::FALLBACK_MESSAGE`]. Malformed input is
    /// rejected before any request is made.
    pub async fn login(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<SessionUser, LoginFailure> {
        let email = Email::parse(email).map_err(|e| LoginFailure {
            message: e.to_string(),
            kind: Some(ErrorKind::ValidationFailure),
        })?;

        let LoginResponse { token, user } = match self.inner.client.login(&email, &password).await
        {
            Ok(response) => response,
            Err(e) => {
                info!(error = %e, kind = ?e.kind(), "Login rejected");
                return Err(LoginFailure::from_api(&e));
            }
        };

        if let Err(e) = self.inner.client.tokens().set(TokenSlot::Admin, token) {
            error!(error = %e, "Failed to persist session token");
            return Err(LoginFailure {
                message: LoginFailure::FALLBACK_MESSAGE.to_string(),
                kind: None,
            });
        }

        self.inner
            .commit(SessionState::Authenticated(user.clone()), "login");
        Ok(user)
    }

    /// Drop the session locally. No request is made.
    pub fn logout(&self) {
        if let Err(e) = self.inner.client.tokens().remove(TokenSlot::Admin) {
            warn!(error = %e, "Failed to remove session token on logout");
        }
        self.inner.commit(SessionState::Anonymous, "logout");
    }

    /// Run `fut` with this store installed as the current session.
    pub async fn provide<F: Future>(self, fut: F) -> F::Output {
        provide_session(self, fut).await
    }
}

tokio::task_local! {
    static CURRENT_SESSION: SessionStore;
}

/// Run `fut` with `store` reachable through [`use_session`].
pub async fn provide_session<F: Future>(store: SessionStore, fut: F) -> F::Output {
    CURRENT_SESSION.scope(store, fut).await
}

/// The session store installed by [`provide_session`].
///
/// # Panics
///
/// Panics when called outside a provider. That is an integration bug, not a
/// runtime condition.
#[must_use]
pub fn use_session() -> SessionStore {
    CURRENT_SESSION
        .try_with(SessionStore::clone)
        .unwrap_or_else(|_| panic!("session store accessed outside of its provider"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use am_botanics_core::{Role, UserId};
    use reqwest::Method;
    use url::Url;
    use uuid::Uuid;

    use super::*;
    use crate::http::ApiClientConfig;
    use crate::storage::{MemoryTokenStore, TokenStore};

    // Nothing listens here; tests that would hit the network fail loudly.
    const UNROUTABLE: &str = "http://127.0.0.1:9";

    fn store_with(tokens: MemoryTokenStore) -> SessionStore {
        let client = ApiClient::new(
            ApiClientConfig::new(Url::parse(UNROUTABLE).unwrap()),
            Arc::new(tokens),
        )
        .unwrap();
        SessionStore::new(client)
    }

    fn admin_user() -> SessionUser {
        SessionUser {
            id: UserId::new("u1"),
            role: Role::Admin,
            name: Some("Ayesha".to_string()),
            email: None,
            profile: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let store = store_with(MemoryTokenStore::new());
        let snapshot = store.snapshot();
        assert!(snapshot.loading());
        assert!(!snapshot.is_admin());
        assert_eq!(snapshot.revision, 0);
    }

    #[tokio::test]
    async fn test_rehydrate_without_token_is_anonymous() {
        let store = store_with(MemoryTokenStore::new());
        let snapshot = store.rehydrate().await;
        assert_eq!(snapshot.state, SessionState::Anonymous);
        assert!(!snapshot.loading());
    }

    #[tokio::test]
    async fn test_start_then_wait_until_settled() {
        let store = store_with(MemoryTokenStore::new());
        store.start();
        let settled = store.wait_until_settled().await;
        assert_eq!(settled.state, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_validation_keeps_state() {
        let store = store_with(MemoryTokenStore::new());
        let before = store.snapshot();

        let failure = store
            .login("not-an-email", SecretString::from("pw".to_owned()))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, Some(ErrorKind::ValidationFailure));

        let failure = store
            .login("owner@botanics.pk", SecretString::from(String::new()))
            .await
            .unwrap_err();
        assert_eq!(failure.message, "password cannot be empty");

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_logout_clears_admin_slot_only() {
        let tokens = MemoryTokenStore::with_token(TokenSlot::Admin, "adm");
        tokens
            .set(TokenSlot::Customer, SecretString::from("cust".to_owned()))
            .unwrap();
        let store = store_with(tokens);

        store.logout();

        let tokens = store.client().tokens();
        assert!(tokens.get(TokenSlot::Admin).is_none());
        assert!(tokens.get(TokenSlot::Customer).is_some());
        assert_eq!(store.snapshot().state, SessionState::Anonymous);
    }

    #[test]
    fn test_unauthorized_event_ends_session() {
        let store = store_with(MemoryTokenStore::new());
        store
            .inner
            .commit(SessionState::Authenticated(admin_user()), "test");
        assert!(store.is_admin());

        store.client().handle_unauthorized(&UnauthorizedEvent {
            method: Method::GET,
            path: "/api/orders".to_string(),
            request_id: Uuid::new_v4(),
        });
        assert_eq!(store.snapshot().state, SessionState::Anonymous);
    }

    #[test]
    fn test_unauthorized_login_keeps_state() {
        let store = store_with(MemoryTokenStore::new());
        store
            .inner
            .commit(SessionState::Authenticated(admin_user()), "test");
        let before = store.snapshot();

        store.client().handle_unauthorized(&UnauthorizedEvent {
            method: Method::POST,
            path: LOGIN_PATH.to_string(),
            request_id: Uuid::new_v4(),
        });
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_failure_message_fallback() {
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, String::new());
        let failure = LoginFailure::from_api(&err);
        assert_eq!(failure.message, LoginFailure::FALLBACK_MESSAGE);
        assert_eq!(failure.kind, Some(ErrorKind::ServerRejected));
    }

    #[tokio::test]
    async fn test_use_session_inside_provider() {
        let store = store_with(MemoryTokenStore::new());
        let revision = store
            .clone()
            .provide(async { use_session().snapshot().revision })
            .await;
        assert_eq!(revision, store.snapshot().revision);
    }

    #[test]
    #[should_panic(expected = "session store accessed outside of its provider")]
    fn test_use_session_outside_provider_panics() {
        let _ = use_session();
    }
}
