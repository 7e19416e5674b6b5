//! Crypto primitive capability.
//!
//! The rest of the crate never touches a cipher or KDF directly; it goes
//! through [`CryptoProvider`] so hosts can swap the primitive source (or
//! inject failures in tests).

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use sha2::Sha256;

use crate::error::{Result, SolaceError};

/// Symmetric key length in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count for password-derived keys.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Random bytes, an AEAD cipher, and a password KDF.
pub trait CryptoProvider: Send + Sync {
    /// Fill `buf` with cryptographically secure random bytes.
    fn fill_random(&self, buf: &mut [u8]) -> Result<()>;

    /// Encrypt and authenticate `plaintext`. Returns ciphertext with the tag appended.
    fn seal(
        &self,
        key: &[u8; KEY_LENGTH],
        nonce: &[u8; NONCE_LENGTH],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Verify and decrypt. Fails with `DecryptionFailed` when the tag does not verify.
    fn open(
        &self,
        key: &[u8; KEY_LENGTH],
        nonce: &[u8; NONCE_LENGTH],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Derive key bytes from a password and salt.
    fn derive(&self, password: &[u8], salt: &[u8], out: &mut [u8; KEY_LENGTH]) -> Result<()>;
}

/// Default provider: AES-256-GCM, PBKDF2-HMAC-SHA256, and the OS RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCrypto;

impl CryptoProvider for SystemCrypto {
    fn fill_random(&self, buf: &mut [u8]) -> Result<()> {
        getrandom::getrandom(buf)
            .map_err(|e| SolaceError::CryptoUnavailable(format!("OS random source failed: {}", e)))
    }

    fn seal(
        &self,
        key: &[u8; KEY_LENGTH],
        nonce: &[u8; NONCE_LENGTH],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| SolaceError::CryptoUnavailable(format!("Invalid AES key: {}", e)))?;
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| SolaceError::CryptoUnavailable("AES-GCM encryption failed".to_string()))
    }

    fn open(
        &self,
        key: &[u8; KEY_LENGTH],
        nonce: &[u8; NONCE_LENGTH],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| SolaceError::CryptoUnavailable(format!("Invalid AES key: {}", e)))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SolaceError::DecryptionFailed("authentication tag mismatch".to_string()))
    }

    fn derive(&self, password: &[u8], salt: &[u8], out: &mut [u8; KEY_LENGTH]) -> Result<()> {
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let provider = SystemCrypto;
        let key = [7u8; KEY_LENGTH];
        let nonce = [1u8; NONCE_LENGTH];

        let sealed = provider.seal(&key, &nonce, b"quiet morning").unwrap();
        assert_eq!(sealed.len(), b"quiet morning".len() + TAG_LENGTH);

        let opened = provider.open(&key, &nonce, &sealed).unwrap();
        assert_eq!(opened, b"quiet morning");
    }

    #[test]
    fn test_open_with_wrong_key_is_decryption_failure() {
        let provider = SystemCrypto;
        let nonce = [1u8; NONCE_LENGTH];
        let sealed = provider.seal(&[7u8; KEY_LENGTH], &nonce, b"data").unwrap();

        let err = provider
            .open(&[8u8; KEY_LENGTH], &nonce, &sealed)
            .unwrap_err();
        assert!(matches!(err, SolaceError::DecryptionFailed(_)));
    }

    #[test]
    fn test_random_bytes_differ() {
        let provider = SystemCrypto;
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        provider.fill_random(&mut a).unwrap();
        provider.fill_random(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_deterministic_and_salt_sensitive() {
        let provider = SystemCrypto;
        let mut a = [0u8; KEY_LENGTH];
        let mut b = [0u8; KEY_LENGTH];
        let mut c = [0u8; KEY_LENGTH];
        provider.derive(b"passwd", b"salt-0123456789ab", &mut a).unwrap();
        provider.derive(b"passwd", b"salt-0123456789ab", &mut b).unwrap();
        provider.derive(b"passwd", b"salt-0123456789ac", &mut c).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
