//! The user identity held by an active session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Role, UserId};

/// User identity returned by `/api/auth/login` and `/api/auth/me`.
///
/// Only `id` and `role` are interpreted by the client. Display fields are
/// optional, and any other profile attributes the backend sends are kept in
/// [`SessionUser::profile`] untouched.
///
/// The identifier is read from `id`, falling back to Mongo-style `_id`;
/// payloads carrying both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSessionUser")]
pub struct SessionUser {
    /// Backend identifier.
    pub id: UserId,
    /// Role as reported by the server.
    #[serde(default)]
    pub role: Role,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact email, kept as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Remaining profile fields.
    #[serde(flatten)]
    pub profile: BTreeMap<String, serde_json::Value>,
}

/// Wire shape of [`SessionUser`] before the identifier is chosen.
#[derive(Deserialize)]
struct RawSessionUser {
    #[serde(default)]
    id: Option<UserId>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<UserId>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(flatten)]
    profile: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawSessionUser> for SessionUser {
    type Error = &'static str;

    fn try_from(raw: RawSessionUser) -> Result<Self, Self::Error> {
        let id = raw.id.or(raw.mongo_id).ok_or("missing field `id`")?;
        Ok(Self {
            id,
            role: raw.role,
            name: raw.name,
            email: raw.email,
            profile: raw.profile,
        })
    }
}

impl SessionUser {
    /// Whether this user may open admin pages.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Best label for navigation chrome: name, then email, then ID.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}
