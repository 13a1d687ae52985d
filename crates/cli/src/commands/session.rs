//! Session commands: `login`, `logout`, `whoami`.

use am_botanics_client::SessionState;
use am_botanics_core::SessionUser;
use am_botanics_storefront::Shell;
use secrecy::SecretString;

use super::CommandError;

fn describe(user: &SessionUser) -> String {
    format!("{} ({}, id {})", user.display_name(), user.role, user.id)
}

/// Log in and persist the token.
pub async fn login(shell: &Shell, email: &str, password: String) -> Result<(), CommandError> {
    let user = shell.login(email, SecretString::from(password)).await?;
    tracing::info!(user_id = %user.id, "Login successful");

    #[allow(clippy::print_stdout)]
    {
        println!("Logged in as {}", describe(&user));
    }
    Ok(())
}

/// Remove the stored token.
pub fn logout(shell: &Shell) {
    shell.logout();

    #[allow(clippy::print_stdout)]
    {
        println!("Logged out");
    }
}

/// Validate the stored token against the backend and print the result.
pub async fn whoami(shell: &Shell) {
    let snapshot = shell.session().rehydrate().await;

    let line = match &snapshot.state {
        SessionState::Authenticated(user) => describe(user),
        SessionState::Anonymous | SessionState::Unknown => "Not logged in".to_string(),
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{line}");
    }
}
