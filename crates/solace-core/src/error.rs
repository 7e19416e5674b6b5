//! Error types for Solace core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer will map these
//! to user-friendly messages.

use thiserror::Error;

/// Result type alias for Solace operations.
pub type Result<T> = std::result::Result<T, SolaceError>;

/// Core error type for Solace operations.
#[derive(Debug, Error)]
pub enum SolaceError {
    /// The crypto provider is missing, unsupported, or failed internally
    #[error("Crypto unavailable: {0}")]
    CryptoUnavailable(String),

    /// Authentication tag did not verify (wrong key, wrong password, corrupted data)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Local or remote store I/O error
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// Key material is missing and cannot be regenerated in the current key mode
    #[error("Key unavailable: {0}")]
    KeyUnavailable(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored JSON could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Discriminant of [`SolaceError`], cheap to copy into per-record reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CryptoUnavailable,
    DecryptionFailed,
    PersistenceFailed,
    KeyUnavailable,
    InvalidInput,
    Serialization,
}

impl SolaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolaceError::CryptoUnavailable(_) => ErrorKind::CryptoUnavailable,
            SolaceError::DecryptionFailed(_) => ErrorKind::DecryptionFailed,
            SolaceError::PersistenceFailed(_) => ErrorKind::PersistenceFailed,
            SolaceError::KeyUnavailable(_) => ErrorKind::KeyUnavailable,
            SolaceError::InvalidInput(_) => ErrorKind::InvalidInput,
            SolaceError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::CryptoUnavailable => "crypto unavailable",
            ErrorKind::DecryptionFailed => "decryption failed",
            ErrorKind::PersistenceFailed => "persistence failed",
            ErrorKind::KeyUnavailable => "key unavailable",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Serialization => "serialization error",
        };
        f.write_str(name)
    }
}

impl From<std::io::Error> for SolaceError {
    fn from(err: std::io::Error) -> Self {
        SolaceError::PersistenceFailed(err.to_string())
    }
}

impl From<rusqlite::Error> for SolaceError {
    fn from(err: rusqlite::Error) -> Self {
        SolaceError::PersistenceFailed(format!("SQLite error: {}", err))
    }
}

impl From<serde_json::Error> for SolaceError {
    fn from(err: serde_json::Error) -> Self {
        SolaceError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            SolaceError::DecryptionFailed("bad tag".into()).kind(),
            ErrorKind::DecryptionFailed
        );
        assert_eq!(
            SolaceError::KeyUnavailable("no password".into()).kind(),
            ErrorKind::KeyUnavailable
        );
    }

    #[test]
    fn test_io_error_maps_to_persistence() {
        let err: SolaceError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert_eq!(err.kind(), ErrorKind::PersistenceFailed);
        assert!(err.to_string().contains("disk gone"));
    }
}
