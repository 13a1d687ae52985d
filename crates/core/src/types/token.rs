//! Persisted credential slots.

use serde::{Deserialize, Serialize};

/// One of the two places a bearer token can be persisted on the client.
///
/// Outgoing requests use the first slot that holds a token, in
/// [`TokenSlot::PRIORITY`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSlot {
    /// Token obtained through `/api/auth/login`.
    #[serde(rename = "adminToken")]
    Admin,
    /// Token obtained through the customer flows owned by page modules.
    #[serde(rename = "customerToken")]
    Customer,
}

impl TokenSlot {
    /// Lookup order for the `Authorization` header.
    pub const PRIORITY: [Self; 2] = [Self::Admin, Self::Customer];

    /// Storage key for the slot.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Admin => "adminToken",
            Self::Customer => "customerToken",
        }
    }
}

impl std::fmt::Display for TokenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
