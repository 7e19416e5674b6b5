//! # Solace Core
//!
//! Core library for Solace - an encrypted journal and mood tracker that works
//! offline and can move its data into a shared multi-device store.
//!
//! This crate provides the encryption layer, the store abstractions and the
//! persistence orchestrator, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: AES-256-GCM record cipher, key derivation and the key manager
//! - **storage**: Local and remote store traits, implementations and record types
//! - **state**: Device-scoped key material, migration flag and device id
//! - **sync**: The orchestrator: backend selection, mood dedup, migration
//! - **clock**: Time source for local day boundaries

pub mod clock;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod state;
pub mod storage;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::{KeyManager, KeySource, RecordCipher, SymmetricKey, SystemCrypto};
pub use error::{ErrorKind, Result, SolaceError};
pub use state::DeviceState;
pub use storage::{LocalStore, RemoteStore};
pub use sync::{BackendMode, MigrationReport, Orchestrator};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
