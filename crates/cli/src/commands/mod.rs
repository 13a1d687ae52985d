//! Command implementations.

pub mod pages;
pub mod session;

use am_botanics_client::LoginFailure;
use am_botanics_storefront::ShellError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Shell construction or rendering failed.
    #[error(transparent)]
    Shell(#[from] ShellError),

    /// The backend refused the login.
    #[error("Login failed: {0}")]
    Login(#[from] LoginFailure),
}
