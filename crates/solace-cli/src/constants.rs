//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Config or store not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Key unavailable (missing password, wrong mode, reset declined).
    pub const AUTH_FAILED: i32 = 5;

    /// Remote store unreachable or a write failed.
    pub const PERSISTENCE_FAILED: i32 = 6;
}

/// Environment variable holding the journal password.
pub const PASSWORD_ENV: &str = "SOLACE_PASSWORD";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "SOLACE_LOG";
