//! Am-Botanics storefront shell.
//!
//! Composes the route table, the admin gate, lazily loaded page modules and
//! the shared chrome (navbar, footer, contact widget, admin sidebar) on top
//! of the session store from `am-botanics-client`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use am_botanics_client::MemoryTokenStore;
//! use am_botanics_storefront::{History, Shell, StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let shell = Shell::new(config, Arc::new(MemoryTokenStore::new()), Arc::new(History::new()))?;
//! shell.start();
//!
//! match shell.visit("/admin/orders").await? {
//!     Rendered::View(view) => println!("{}", view.html),
//!     Rendered::Redirect { to } => println!("redirected to {to}"),
//!     Rendered::Superseded => {}
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gate;
pub mod loading;
pub mod navigation;
pub mod pages;
pub mod preload;
pub mod routes;
pub mod shell;
pub mod views;

pub use config::{ConfigError, SiteConfig, StorefrontConfig};
pub use error::ShellError;
pub use gate::{AdminGate, GateDecision};
pub use loading::{LoadingGuard, LoadingIndicator};
pub use navigation::{History, LOGIN_ROUTE, LoginRedirect, Navigator, is_login_route};
pub use pages::{LoadState, PageContext, PageLoader, PageModule, PageRegistry, loader};
pub use preload::{PRODUCTS_PATH, ProductPreload};
pub use routes::{Chrome, PageId, RouteDescriptor, RouteMatch, RouteTable};
pub use shell::{Rendered, Shell, Startup, View, ViewStatus};
pub use views::{Logo, LogoSize, LogoVariant};
