//! Cryptographic primitives for Solace.
//!
//! This module provides:
//! - A swappable primitive provider (AES-256-GCM, PBKDF2, OS randomness)
//! - Key generation, export and password derivation
//! - The record cipher that seals journal entries into packages
//! - The key manager that owns the journal key lifecycle

pub mod cipher;
pub mod key;
pub mod manager;
pub mod password;
pub mod provider;

pub use cipher::RecordCipher;
pub use key::{derive_key, SymmetricKey, SALT_LENGTH};
pub use manager::{KeyManager, KeyMaterial, KeySource, ResetConfirmation, RESET_PHRASE};
pub use password::validate_password;
pub use provider::{CryptoProvider, SystemCrypto, KEY_LENGTH, PBKDF2_ITERATIONS};
