//! Symmetric journal keys.
//!
//! Device keys are random; password keys are derived with PBKDF2-HMAC-SHA256
//! over a persisted 16-byte salt. Either way the result is a [`SymmetricKey`]
//! that is zeroized on drop.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use super::provider::{CryptoProvider, KEY_LENGTH};
use crate::error::{Result, SolaceError};

/// Salt length in bytes for password-derived keys.
pub const SALT_LENGTH: usize = 16;

/// A 256-bit AES-GCM key.
///
/// This type ensures that key material is securely zeroized from memory
/// when dropped, reducing the window of exposure.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; KEY_LENGTH],
}

/// Exportable form of a device key, shaped like a JSON Web Key.
#[derive(Serialize, Deserialize)]
struct ExportedKey {
    kty: String,
    alg: String,
    k: String,
}

impl SymmetricKey {
    /// Create a key from raw bytes.
    ///
    /// # Security
    ///
    /// The caller is responsible for ensuring the bytes come from a secure source.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Generate a fresh random key.
    pub fn generate(provider: &dyn CryptoProvider) -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; KEY_LENGTH]);
        provider.fill_random(&mut bytes[..])?;
        Ok(Self::from_bytes(*bytes))
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Serialize to the persisted JWK-like JSON form.
    pub fn export(&self) -> Result<String> {
        let exported = ExportedKey {
            kty: "oct".to_string(),
            alg: "A256GCM".to_string(),
            k: URL_SAFE_NO_PAD.encode(self.key),
        };
        Ok(serde_json::to_string(&exported)?)
    }

    /// Parse the persisted form produced by [`SymmetricKey::export`].
    pub fn import(data: &str) -> Result<Self> {
        let exported: ExportedKey = serde_json::from_str(data)?;
        if exported.kty != "oct" || exported.alg != "A256GCM" {
            return Err(SolaceError::KeyUnavailable(format!(
                "Unsupported key type {}/{}",
                exported.kty, exported.alg
            )));
        }
        let raw = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(exported.k.as_bytes())
                .map_err(|e| SolaceError::KeyUnavailable(format!("Invalid key encoding: {}", e)))?,
        );
        let bytes: [u8; KEY_LENGTH] = raw.as_slice().try_into().map_err(|_| {
            SolaceError::KeyUnavailable(format!(
                "Stored key must be {} bytes (got {})",
                KEY_LENGTH,
                raw.len()
            ))
        })?;
        Ok(Self::from_bytes(bytes))
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an encryption key from a password.
///
/// # Arguments
///
/// * `provider` - Source of the KDF
/// * `password` - The password to derive from
/// * `salt` - Random salt (persisted once per device)
///
/// # Security
///
/// - Same password + salt always produces same key (deterministic)
/// - Different salt produces different key
pub fn derive_key(
    provider: &dyn CryptoProvider,
    password: &str,
    salt: &[u8],
) -> Result<SymmetricKey> {
    if password.is_empty() {
        return Err(SolaceError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    if salt.len() < SALT_LENGTH {
        return Err(SolaceError::InvalidInput(format!(
            "Salt must be at least {} bytes",
            SALT_LENGTH
        )));
    }

    let mut key_bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    provider.derive(password.as_bytes(), salt, &mut key_bytes)?;
    Ok(SymmetricKey::from_bytes(*key_bytes))
}
