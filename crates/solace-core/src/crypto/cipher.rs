//! Record cipher: self-contained ciphertext packages.
//!
//! A package is `base64(nonce || ciphertext || tag)`. Each call draws a fresh
//! random nonce, so encrypting the same plaintext twice never yields the same
//! package.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::key::SymmetricKey;
use super::provider::{CryptoProvider, NONCE_LENGTH, TAG_LENGTH};
use crate::error::{Result, SolaceError};
use crate::storage::types::JournalEntry;

/// Stateless AEAD wrapper; borrows a key only for the duration of one call.
#[derive(Clone)]
pub struct RecordCipher {
    provider: Arc<dyn CryptoProvider>,
}

impl RecordCipher {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Encrypt `plaintext` into a storage-ready package.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use solace_core::crypto::{RecordCipher, SymmetricKey, SystemCrypto};
    ///
    /// let cipher = RecordCipher::new(Arc::new(SystemCrypto));
    /// let key = SymmetricKey::generate(&SystemCrypto).unwrap();
    /// let package = cipher.encrypt(b"secret data", &key).unwrap();
    /// assert_eq!(cipher.decrypt(&package, &key).unwrap(), b"secret data");
    /// ```
    pub fn encrypt(&self, plaintext: &[u8], key: &SymmetricKey) -> Result<String> {
        let mut nonce = [0u8; NONCE_LENGTH];
        self.provider.fill_random(&mut nonce)?;

        let ciphertext = self.provider.seal(key.as_bytes(), &nonce, plaintext)?;

        let mut package = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        package.extend_from_slice(&nonce);
        package.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(package))
    }

    /// Decrypt a package produced by [`RecordCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `SolaceError::DecryptionFailed` if:
    /// - The key is wrong (device key reset, wrong password)
    /// - The package is corrupted or truncated
    pub fn decrypt(&self, package: &str, key: &SymmetricKey) -> Result<Vec<u8>> {
        let combined = STANDARD
            .decode(package.trim().as_bytes())
            .map_err(|e| SolaceError::DecryptionFailed(format!("Malformed package: {}", e)))?;

        if combined.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(SolaceError::DecryptionFailed(format!(
                "Package too short ({} bytes)",
                combined.len()
            )));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LENGTH);
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(nonce_bytes);

        self.provider.open(key.as_bytes(), &nonce, ciphertext)
    }

    /// Serialize and encrypt a whole journal entry.
    pub fn seal_entry(&self, entry: &JournalEntry, key: &SymmetricKey) -> Result<String> {
        let plaintext = zeroize::Zeroizing::new(serde_json::to_vec(entry)?);
        self.encrypt(&plaintext, key)
    }

    /// Decrypt and deserialize a journal entry sealed with [`RecordCipher::seal_entry`].
    pub fn open_entry(&self, package: &str, key: &SymmetricKey) -> Result<JournalEntry> {
        let plaintext = zeroize::Zeroizing::new(self.decrypt(package, key)?);
        Ok(serde_json::from_slice(&plaintext)?)
    }
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCipher").finish_non_exhaustive()
    }
}
