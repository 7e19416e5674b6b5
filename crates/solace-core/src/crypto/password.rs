//! Password validation.
//!
//! Enforces minimum requirements for a journal password before it is used
//! to derive the journal key.

use crate::error::{Result, SolaceError};

/// Minimum password length in characters.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate a new journal password.
///
/// # Requirements
///
/// - At least 8 characters long
/// - Not empty or only whitespace
///
/// # Examples
///
/// ```
/// use solace_core::crypto::validate_password;
///
/// assert!(validate_password("my-secure-password-123").is_ok());
/// assert!(validate_password("short").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(SolaceError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(SolaceError::InvalidInput(format!(
            "Password must be at least {} characters (got {})",
            MIN_PASSWORD_LENGTH, length
        )));
    }

    Ok(())
}
