//! Error taxonomy for backend calls.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Coarse classification of an [`ApiError`], stable enough to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received.
    NetworkFailure,
    /// The fixed request deadline elapsed.
    Timeout,
    /// The backend answered `401`.
    Unauthorized,
    /// The backend answered with another non-2xx status.
    ServerRejected,
    /// A 2xx response whose body could not be decoded.
    MalformedBody,
    /// The request was refused before it was sent.
    ValidationFailure,
}

/// Errors returned by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connect, reset, TLS).
    #[error("network failure: {0}")]
    Network(#[source] reqwest::Error),

    /// No response within the configured timeout.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend rejected the credentials attached to the request.
    #[error("unauthorized")]
    Unauthorized {
        /// Raw response body.
        body: String,
    },

    /// Any other non-2xx status.
    #[error("server rejected request ({status}){}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    ServerRejected {
        /// Response status.
        status: StatusCode,
        /// `message` field of a JSON error body, when present.
        message: Option<String>,
        /// Raw response body.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response body ({status}): {source}")]
    Decode {
        /// Response status.
        status: StatusCode,
        /// Raw response body.
        body: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Caller-side validation failed; nothing was sent.
    #[error("invalid request: {0}")]
    Validation(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::ServerRejected { .. } => ErrorKind::ServerRejected,
            Self::Decode { .. } => ErrorKind::MalformedBody,
            Self::Validation(_) => ErrorKind::ValidationFailure,
        }
    }

    /// HTTP status of the response, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::ServerRejected { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Network(_) | Self::Timeout(_) | Self::Validation(_) => None,
        }
    }

    /// Raw response body, if one was received.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { body }
            | Self::ServerRejected { body, .. }
            | Self::Decode { body, .. } => Some(body),
            Self::Network(_) | Self::Timeout(_) | Self::Validation(_) => None,
        }
    }

    /// Server-provided, user-displayable message.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::ServerRejected { message, .. } => message.clone(),
            Self::Unauthorized { body } => message_from_body(body),
            _ => None,
        }
    }

    /// Build the error for a non-2xx response.
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return Self::Unauthorized { body };
        }
        let message = message_from_body(&body);
        Self::ServerRejected {
            status,
            message,
            body,
        }
    }

    /// Map a transport error, separating deadline expiry from other failures.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(err)
        }
    }
}

fn message_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}
