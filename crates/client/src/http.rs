//! JSON-over-HTTP client for the storefront backend.
//!
//! # Request pipeline
//!
//! 1. Resolve the path against the configured base URL
//! 2. Attach `Authorization: Bearer <token>` from the first non-empty slot
//!    (`adminToken` before `customerToken`)
//! 3. Send with a fixed timeout and a fresh `X-Request-Id`
//! 4. On `401`: clear both slots, then call every registered
//!    [`UnauthorizedHandler`] once, before the error is returned
//! 5. Any other failure is returned unchanged; there is no retry

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::TokenStore;

/// Header carrying the per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base address every path is resolved against.
    pub base_url: Url,
    /// Deadline for a whole request, connect through body.
    pub timeout: Duration,
}

impl ApiClientConfig {
    /// Default backend address when none is configured.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:5000";

    /// Default request deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Configuration for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Override the request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credentials {
    Attach,
    Omit,
}

/// Details of a request that came back `401`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedEvent {
    /// HTTP method of the failed request.
    pub method: Method,
    /// Path as passed by the caller.
    pub path: String,
    /// Correlation ID sent with the request.
    pub request_id: Uuid,
}

/// Reaction to a `401` from any call site.
///
/// Handlers run synchronously on the task that issued the request, after the
/// token slots have been cleared and before the caller sees the error.
pub trait UnauthorizedHandler: Send + Sync {
    /// Called once per `401` response.
    fn on_unauthorized(&self, event: &UnauthorizedEvent);
}

impl<F> UnauthorizedHandler for F
where
    F: Fn(&UnauthorizedEvent) + Send + Sync,
{
    fn on_unauthorized(&self, event: &UnauthorizedEvent) {
        self(event);
    }
}

/// HTTP client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool, token store and
/// handler list.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ApiClientConfig,
    tokens: Arc<dyn TokenStore>,
    handlers: RwLock<Vec<Arc<dyn UnauthorizedHandler>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("timeout", &self.inner.config.timeout)
            .field("handlers", &self.inner.handlers.read().len())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the underlying HTTP client cannot be
    /// initialised (e.g. TLS backend failure).
    pub fn new(config: ApiClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                config,
                tokens,
                handlers: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.config.base_url
    }

    /// Shared token store.
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.inner.tokens
    }

    /// Register a handler for `401` responses.
    pub fn add_unauthorized_handler(&self, handler: impl UnauthorizedHandler + 'static) {
        self.inner.handlers.write().push(Arc::new(handler));
    }

    /// Resolve `path` against the base URL.
    ///
    /// Absolute URLs are accepted only when they share the base URL's origin,
    /// so the bearer token never leaves the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for unparseable paths or foreign
    /// origins.
    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        let base = &self.inner.config.base_url;
        let url = match Url::parse(path) {
            Ok(absolute) => absolute,
            Err(url::ParseError::RelativeUrlWithoutBase) => base
                .join(path)
                .map_err(|e| ApiError::Validation(format!("invalid path {path:?}: {e}")))?,
            Err(e) => return Err(ApiError::Validation(format!("invalid path {path:?}: {e}"))),
        };

        if url.origin() != base.origin() {
            return Err(ApiError::Validation(format!(
                "refusing to send credentials to foreign origin {}",
                url.origin().ascii_serialization()
            )));
        }
        Ok(url)
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// `GET` a resource whose shape is owned by someone else.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_json_value(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        self.get(path).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    /// Send a request and decode a 2xx JSON body into `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; additionally [`ApiError::Decode`] when the
    /// body does not match `T`.
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::Validation(format!("request body is not serializable: {e}")))?;

        let (status, text) = self.send(method, path, body).await?;

        // An empty 2xx body decodes as JSON null so `T = ()` works for 204s.
        let raw = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(raw).map_err(|source| ApiError::Decode {
            status,
            body: text.clone(),
            source,
        })
    }

    /// Send a request and return the status and raw body of a 2xx response.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] if the path cannot be resolved
    /// - [`ApiError::Timeout`] if the deadline elapses
    /// - [`ApiError::Network`] for other transport failures
    /// - [`ApiError::Unauthorized`] for `401`, after clearing both token
    ///   slots and running the unauthorized handlers
    /// - [`ApiError::ServerRejected`] for other non-2xx statuses
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(reqwest::StatusCode, String), ApiError> {
        self.dispatch(method, path, body, Credentials::Attach).await
    }

    /// `GET` a public JSON resource without credentials, the way a browser
    /// `crossorigin="anonymous"` preload does.
    ///
    /// A `401` here says nothing about the session, so it is returned as an
    /// error without clearing tokens or notifying handlers.
    ///
    /// # Errors
    ///
    /// Same kinds as [`ApiClient::request`].
    pub async fn get_public_json(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        let (status, text) = self
            .dispatch(Method::GET, path, None, Credentials::Omit)
            .await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            status,
            body: text.clone(),
            source,
        })
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        credentials: Credentials,
    ) -> Result<(reqwest::StatusCode, String), ApiError> {
        let url = self.resolve(path)?;
        let request_id = Uuid::new_v4();
        let timeout = self.inner.config.timeout;

        let mut builder = self
            .inner
            .http
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if credentials == Credentials::Attach
            && let Some((slot, token)) = self.inner.tokens.first_available()
        {
            debug!(%request_id, slot = %slot, "Attaching bearer token");
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        debug!(%request_id, %method, path, "Sending API request");
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, timeout))?;

        debug!(%request_id, %method, path, status = status.as_u16(), "API response received");

        if status.is_success() {
            return Ok((status, text));
        }

        let err = ApiError::from_status(status, text);
        if credentials == Credentials::Attach && matches!(err, ApiError::Unauthorized { .. }) {
            self.handle_unauthorized(&UnauthorizedEvent {
                method,
                path: path.to_owned(),
                request_id,
            });
        } else {
            debug!(%request_id, status = status.as_u16(), "API request rejected");
        }
        Err(err)
    }

    pub(crate) fn handle_unauthorized(&self, event: &UnauthorizedEvent) {
        warn!(
            request_id = %event.request_id,
            method = %event.method,
            path = %event.path,
            "Unauthorized response; clearing stored credentials"
        );
        if let Err(e) = self.inner.tokens.clear() {
            warn!(error = %e, "Failed to clear stored credentials");
        }

        // Snapshot so handlers may register further handlers without deadlock.
        let handlers: Vec<_> = self.inner.handlers.read().clone();
        for handler in handlers {
            handler.on_unauthorized(event);
        }
    }
}
