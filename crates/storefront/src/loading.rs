//! Global loading overlay flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared "something is in flight" indicator.
///
/// Nested operations each hold a [`LoadingGuard`]; the overlay stays up
/// until the last one is dropped.
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    active: Arc<AtomicUsize>,
}

impl LoadingIndicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the overlay should be shown.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }

    /// Raise the overlay until the returned guard is dropped.
    #[must_use = "the overlay is lowered as soon as the guard is dropped"]
    pub fn begin(&self) -> LoadingGuard {
        self.active.fetch_add(1, Ordering::AcqRel);
        LoadingGuard {
            active: Arc::clone(&self.active),
        }
    }
}

/// Keeps the overlay raised while alive.
#[derive(Debug)]
pub struct LoadingGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
