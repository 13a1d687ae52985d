//! Location tracking and the login redirect.

use std::sync::Arc;

use am_botanics_client::{UnauthorizedEvent, UnauthorizedHandler};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::routes::normalize_path;

/// Login route every failed gate or `401` lands on.
pub const LOGIN_ROUTE: &str = "/auth";

/// Whether `path` points at the login route, ignoring query and trailing
/// slash.
#[must_use]
pub fn is_login_route(path: &str) -> bool {
    normalize_path(path) == LOGIN_ROUTE
}

/// Owner of the current location.
pub trait Navigator: Send + Sync {
    /// Path currently displayed.
    fn current_path(&self) -> String;

    /// Move to `path`.
    fn navigate(&self, path: &str);
}

/// In-memory navigation history.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl Default for History {
    fn default() -> Self {
        Self::starting_at("/")
    }
}

impl History {
    /// History positioned at `/`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History positioned at `path`.
    #[must_use]
    pub fn starting_at(path: &str) -> Self {
        Self {
            entries: Mutex::new(vec![path.to_string()]),
        }
    }

    /// Every location visited, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.entries.lock().last().cloned().unwrap_or_else(|| "/".to_string())
    }

    fn navigate(&self, path: &str) {
        debug!(path, "Navigating");
        self.entries.lock().push(path.to_string());
    }
}

/// Sends the user to [`LOGIN_ROUTE`] when the backend rejects their
/// credentials, unless they are already there.
pub struct LoginRedirect {
    navigator: Arc<dyn Navigator>,
}

impl LoginRedirect {
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

impl UnauthorizedHandler for LoginRedirect {
    fn on_unauthorized(&self, event: &UnauthorizedEvent) {
        let current = self.navigator.current_path();
        if is_login_route(&current) {
            debug!(path = %event.path, "Already on login route; not redirecting");
            return;
        }
        info!(
            request_id = %event.request_id,
            path = %event.path,
            from = %current,
            "Session rejected; redirecting to login"
        );
        self.navigator.navigate(LOGIN_ROUTE);
    }
}
