//! Am-Botanics Core - Shared types library.
//!
//! This crate provides common types used across all Am-Botanics components:
//! - `client` - HTTP client, token storage and the session store
//! - `storefront` - Route table, admin gate and page chrome
//! - `cli` - Terminal driver for the storefront shell
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, user IDs, roles, session users
//!   and token slots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
