//! Password input from `SOLACE_PASSWORD` or an interactive prompt.

use dialoguer::Password;
use zeroize::Zeroizing;

use crate::constants::PASSWORD_ENV;
use crate::errors::CliError;

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Zeroizing::new)
}

/// Password used to derive the key of a protected journal.
pub fn prompt_password(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(password) = password_from_env() {
        return Ok(password);
    }
    if !interactive {
        return Err(CliError::auth_failed_with_hint(
            "This journal is password protected and no password was provided.",
            "Hint: Set SOLACE_PASSWORD or run without --no-input.",
        )
        .into());
    }
    Password::new()
        .with_prompt("Password")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Prompt for a new password with confirmation.
pub fn prompt_new_password(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(password) = password_from_env() {
        return Ok(password);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            PASSWORD_ENV
        ))
        .into());
    }
    Password::new()
        .with_prompt("New password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}
