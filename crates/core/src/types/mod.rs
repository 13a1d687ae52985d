//! Core types for Am-Botanics.
//!
//! This module provides type-safe wrappers for the identity concepts shared
//! by the client and the storefront shell.

pub mod email;
pub mod id;
pub mod role;
pub mod token;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::Role;
pub use token::TokenSlot;
pub use user::SessionUser;
