//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ShellError` type for everything the shell does besides
//! talking to the session store, which reports its own expected failures as
//! values.

use am_botanics_client::{ApiError, ErrorKind, StorageError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::routes::PageId;

/// Shell-level error type.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Template rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    /// A page module could not be loaded.
    #[error("Failed to load page {page}: {message}")]
    PageLoad {
        /// Page whose loader failed.
        page: PageId,
        /// Loader's explanation.
        message: String,
    },

    /// Token storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ShellError {
    /// Whether this is a fault worth an alert rather than an expected
    /// outcome such as bad credentials.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(err) => !matches!(
                err.kind(),
                ErrorKind::Unauthorized | ErrorKind::ValidationFailure
            ),
            Self::Config(_) | Self::Render(_) | Self::PageLoad { .. } | Self::Storage(_) => true,
        }
    }

    /// Log the error and, when unexpected, capture it to Sentry.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Shell error"
            );
        } else {
            tracing::warn!(error = %self, "Shell error");
        }
    }
}

/// Result type alias for `ShellError`.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("navigation", "Visited page", Some(&[("path", "/product/42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_error_display() {
        let err = ShellError::PageLoad {
            page: PageId::AdminOrders,
            message: "chunk missing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load page admin-orders: chunk missing"
        );
    }

    #[test]
    fn test_expected_api_errors_are_not_alerts() {
        let err = ShellError::from(ApiError::Validation("bad".to_string()));
        assert!(!err.is_unexpected());

        let err = ShellError::PageLoad {
            page: PageId::Home,
            message: "boom".to_string(),
        };
        assert!(err.is_unexpected());
    }

    #[test]
    fn test_report_without_sentry_client_is_harmless() {
        ShellError::PageLoad {
            page: PageId::Faq,
            message: "offline".to_string(),
        }
        .report();
        clear_sentry_user();
        add_breadcrumb("navigation", "Visited page", Some(&[("path", "/faq")]));
    }
}
