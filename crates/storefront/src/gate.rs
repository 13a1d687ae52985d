//! Admin gate.
//!
//! Admin pages render only for an authenticated session whose role is
//! `admin`. While the session is still rehydrating the gate shows a neutral
//! loading view; it never redirects on an undecided session.

use am_botanics_client::{SessionSnapshot, use_session};
use tokio::sync::watch;

use crate::navigation::LOGIN_ROUTE;

/// What the gate lets through for a given session snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Session not settled yet; show the loading view.
    Loading,
    /// Admin session; render the page.
    Allow,
    /// Settled without admin rights; go to the given route.
    Redirect(&'static str),
}

impl GateDecision {
    /// Decide from a snapshot. Pure.
    #[must_use]
    pub fn evaluate(snapshot: &SessionSnapshot) -> Self {
        if snapshot.loading() {
            Self::Loading
        } else if snapshot.is_admin() {
            Self::Allow
        } else {
            Self::Redirect(LOGIN_ROUTE)
        }
    }

    /// Whether the decision is final for the snapshot it was made from.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// Subscription to the provided session that re-evaluates on every change.
#[derive(Debug)]
pub struct AdminGate {
    session: watch::Receiver<SessionSnapshot>,
}

impl AdminGate {
    /// Gate over the session installed by
    /// [`provide_session`](am_botanics_client::provide_session).
    ///
    /// # Panics
    ///
    /// Panics when no session is provided.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::from_receiver(use_session().subscribe())
    }

    /// Gate over an explicit subscription.
    #[must_use]
    pub const fn from_receiver(session: watch::Receiver<SessionSnapshot>) -> Self {
        Self { session }
    }

    /// Decision for the latest snapshot.
    #[must_use]
    pub fn decision(&self) -> GateDecision {
        GateDecision::evaluate(&self.session.borrow())
    }

    /// Wait for the next session change and return the new decision.
    ///
    /// Returns `None` once the session store is gone.
    pub async fn changed(&mut self) -> Option<GateDecision> {
        self.session.changed().await.ok()?;
        Some(GateDecision::evaluate(&self.session.borrow_and_update()))
    }

    /// Wait until the session settles and return the final decision.
    pub async fn settled(&mut self) -> GateDecision {
        if let Ok(snapshot) = self.session.wait_for(|snapshot| !snapshot.loading()).await {
            return GateDecision::evaluate(&snapshot);
        }
        self.decision()
    }
}
