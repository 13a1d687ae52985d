//! Authentication endpoints.

use am_botanics_core::{Email, SessionUser};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

use crate::error::ApiError;
use crate::http::ApiClient;

/// Login endpoint.
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Current-user ("who am I") endpoint.
pub const ME_PATH: &str = "/api/auth/me";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login payload.
#[derive(Deserialize)]
pub struct LoginResponse {
    /// Bearer token to persist.
    #[serde(deserialize_with = "secret_from_string")]
    pub token: SecretString,
    /// Authenticated user.
    pub user: SessionUser,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

fn secret_from_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

#[derive(Deserialize)]
struct MeResponse {
    user: SessionUser,
}

impl ApiClient {
    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an empty password, otherwise any
    /// error from [`ApiClient::send`].
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        if password.expose_secret().is_empty() {
            return Err(ApiError::Validation("password cannot be empty".to_string()));
        }

        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        self.post(LOGIN_PATH, &body).await
    }

    /// Fetch the user the attached token belongs to.
    ///
    /// # Errors
    ///
    /// Any error from [`ApiClient::send`]; an expired or invalid token is
    /// [`ApiError::Unauthorized`].
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<SessionUser, ApiError> {
        let response: MeResponse = self.get(ME_PATH).await?;
        Ok(response.user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_debug_redacts_token() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"token":"jwt-abc","user":{"id":"u1","role":"admin"}}"#,
        )
        .unwrap();
        let debug = format!("{response:?}");
        assert!(!debug.contains("jwt-abc"));
        assert!(response.user.is_admin());
        assert_eq!(response.token.expose_secret(), "jwt-abc");
    }

    #[test]
    fn test_login_request_wire_shape() {
        let body = LoginRequest {
            email: "a@b.pk",
            password: "pw",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"email": "a@b.pk", "password": "pw"})
        );
    }
}
