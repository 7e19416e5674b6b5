//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes. Core errors reach `main` through
//! `anyhow` and are mapped by kind, so store failures exit with
//! `PERSISTENCE_FAILED` without a CLI wrapper.

use std::fmt;

use solace_core::{ErrorKind, SolaceError};

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Config or store not found
    NotFound { message: String, hint: String },

    /// The journal key could not be resolved
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }
}

/// Pick the exit code for an error returned by a handler.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    use super::constants::exit_codes;
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    match err.downcast_ref::<SolaceError>().map(SolaceError::kind) {
        Some(ErrorKind::KeyUnavailable) => exit_codes::AUTH_FAILED,
        Some(ErrorKind::InvalidInput) => exit_codes::INVALID_INPUT,
        Some(ErrorKind::PersistenceFailed) => exit_codes::PERSISTENCE_FAILED,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exit_codes;

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let key = anyhow::Error::new(SolaceError::KeyUnavailable("no password".into()));
        assert_eq!(exit_code_for(&key), exit_codes::AUTH_FAILED);

        let remote = anyhow::Error::new(SolaceError::PersistenceFailed("offline".into()));
        assert_eq!(exit_code_for(&remote), exit_codes::PERSISTENCE_FAILED);

        let input = anyhow::Error::new(SolaceError::InvalidInput("bad mood".into()));
        assert_eq!(exit_code_for(&input), exit_codes::INVALID_INPUT);

        let crypto = anyhow::Error::new(SolaceError::CryptoUnavailable("rng".into()));
        assert_eq!(exit_code_for(&crypto), 1);
    }

    #[test]
    fn test_cli_errors_keep_their_codes() {
        let err = anyhow::Error::new(CliError::not_found("No config", "Run solace init"));
        assert_eq!(exit_code_for(&err), exit_codes::NOT_FOUND);
        assert_eq!(format!("{}", err), "No config\nRun solace init");
    }

    #[test]
    fn test_plain_errors_exit_with_one() {
        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);
    }
}
