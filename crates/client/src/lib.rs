//! Am-Botanics client library.
//!
//! Everything the storefront shell needs to talk to the backend:
//!
//! - [`ApiClient`] - JSON-over-HTTP client that attaches the persisted bearer
//!   token, enforces a fixed timeout and notifies [`UnauthorizedHandler`]s
//!   when the backend answers `401`
//! - [`TokenStore`] - the two persisted credential slots (`adminToken`,
//!   `customerToken`) with in-memory and file-backed implementations
//! - [`SessionStore`] - the authentication state machine
//!   (`Unknown` → `Authenticated` | `Anonymous`) with startup rehydration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use am_botanics_client::{ApiClient, ApiClientConfig, MemoryTokenStore, SessionStore};
//!
//! let tokens = Arc::new(MemoryTokenStore::new());
//! let client = ApiClient::new(ApiClientConfig::new(base_url), tokens)?;
//! let session = SessionStore::new(client.clone());
//! session.start();
//!
//! let settled = session.wait_until_settled().await;
//! if settled.is_admin() {
//!     // render the back-office
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod error;
pub mod http;
pub mod session;
pub mod storage;

pub use auth::{LOGIN_PATH, LoginResponse, ME_PATH};
pub use error::{ApiError, ErrorKind};
pub use http::{ApiClient, ApiClientConfig, UnauthorizedEvent, UnauthorizedHandler};
pub use session::{
    LoginFailure, SessionSnapshot, SessionState, SessionStore, provide_session, use_session,
};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};
