//! Key manager: the one place that creates, loads and destroys the journal key.
//!
//! Two key modes exist. A device key is random and persisted in exportable
//! form. A password key is re-derived on demand from the user's password and
//! a persisted salt; the key itself is never stored.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::key::{derive_key, SymmetricKey, SALT_LENGTH};
use super::password::validate_password;
use super::provider::CryptoProvider;
use crate::error::{Result, SolaceError};
use crate::state::DeviceState;

/// Phrase the user must type to authorize a key reset.
pub const RESET_PHRASE: &str = "RESET";

/// Where the journal key comes from for a session.
pub enum KeySource {
    /// The random key persisted on this device.
    Device,
    /// A key derived from the user's password and the persisted salt.
    Password(SecretString),
}

impl KeySource {
    pub fn password(password: &str) -> Self {
        KeySource::Password(SecretString::from(password.to_string()))
    }

    pub fn is_password(&self) -> bool {
        matches!(self, KeySource::Password(_))
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Device => f.write_str("Device"),
            KeySource::Password(_) => f.write_str("Password([REDACTED])"),
        }
    }
}

/// The active key plus the salt it was derived with, if any.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub key: SymmetricKey,
    pub salt: Option<[u8; SALT_LENGTH]>,
}

/// Proof that the user typed the reset phrase. Only [`KeyManager::confirm_reset`]
/// creates one.
#[derive(Debug)]
pub struct ResetConfirmation {
    _private: (),
}

pub struct KeyManager {
    state: Arc<DeviceState>,
    provider: Arc<dyn CryptoProvider>,
}

impl KeyManager {
    pub fn new(state: Arc<DeviceState>, provider: Arc<dyn CryptoProvider>) -> Self {
        Self { state, provider }
    }

    /// Return the stored device key, generating and persisting one on first use.
    ///
    /// # Errors
    ///
    /// Any store or provider failure is reported as `KeyUnavailable`. A stored
    /// key that cannot be parsed is never silently replaced.
    pub fn get_or_create_device_key(&self) -> Result<SymmetricKey> {
        self.load_or_generate_device_key().map_err(into_key_unavailable)
    }

    fn load_or_generate_device_key(&self) -> Result<SymmetricKey> {
        if let Some(exported) = self.state.exported_key()? {
            return SymmetricKey::import(&exported);
        }

        let key = SymmetricKey::generate(self.provider.as_ref())?;
        self.state.set_exported_key(&key.export()?)?;
        info!("generated new device journal key");
        Ok(key)
    }

    /// Derive the journal key from `password`, persisting a fresh salt on first use.
    pub fn derive_key_from_password(&self, password: &str) -> Result<SymmetricKey> {
        if password.is_empty() {
            return Err(SolaceError::KeyUnavailable(
                "A password is required to derive the journal key".to_string(),
            ));
        }
        let salt = self.salt_or_generate()?;
        derive_key(self.provider.as_ref(), password, &salt)
    }

    fn salt_or_generate(&self) -> Result<[u8; SALT_LENGTH]> {
        if let Some(salt) = self.state.salt()? {
            return Ok(salt);
        }
        let mut salt = [0u8; SALT_LENGTH];
        self.provider.fill_random(&mut salt)?;
        self.state.set_salt(&salt)?;
        debug!("persisted new key derivation salt");
        Ok(salt)
    }

    /// True iff a password salt is persisted on this device.
    pub fn is_password_protected(&self) -> Result<bool> {
        Ok(self.state.salt()?.is_some())
    }

    /// Switch this device to password mode.
    ///
    /// Entries already sealed under the device key are not re-encrypted and
    /// will no longer open once the password key is in use.
    pub fn enable_password(&self, password: &str) -> Result<SymmetricKey> {
        validate_password(password)?;
        let key = self.derive_key_from_password(password)?;
        self.state.set_password_enabled()?;
        info!("password protection enabled");
        Ok(key)
    }

    /// Check the typed phrase and hand out a reset token.
    pub fn confirm_reset(phrase: &str) -> Result<ResetConfirmation> {
        if phrase.trim() == RESET_PHRASE {
            Ok(ResetConfirmation { _private: () })
        } else {
            Err(SolaceError::InvalidInput(format!(
                "Type {} to confirm the key reset",
                RESET_PHRASE
            )))
        }
    }

    /// Irreversibly delete the key, the salt and the password flag.
    ///
    /// Every record sealed under the old key becomes permanently unreadable.
    pub fn reset_key(&self, _confirmation: ResetConfirmation) -> Result<()> {
        self.state.clear_key_material()?;
        warn!("journal key material deleted; existing entries are no longer readable");
        Ok(())
    }

    /// Resolve the active key for `source`.
    ///
    /// # Errors
    ///
    /// Returns `KeyUnavailable` when device mode is requested on a
    /// password-protected device, since no password is available to re-derive
    /// the key.
    pub fn resolve(&self, source: &KeySource) -> Result<KeyMaterial> {
        match source {
            KeySource::Device => {
                if self.is_password_protected().map_err(into_key_unavailable)? {
                    return Err(SolaceError::KeyUnavailable(
                        "Journal is password protected; a password is required".to_string(),
                    ));
                }
                Ok(KeyMaterial {
                    key: self.get_or_create_device_key()?,
                    salt: None,
                })
            }
            KeySource::Password(password) => {
                let key = self.derive_key_from_password(password.expose_secret())?;
                Ok(KeyMaterial {
                    key,
                    salt: self.state.salt()?,
                })
            }
        }
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager").finish_non_exhaustive()
    }
}

fn into_key_unavailable(err: SolaceError) -> SolaceError {
    match err {
        SolaceError::KeyUnavailable(_) => err,
        other => SolaceError::KeyUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SystemCrypto;
    use crate::storage::keys;
    use crate::storage::{LocalStore, MemoryLocalStore};

    struct BrokenStore;

    impl LocalStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(SolaceError::PersistenceFailed("storage disabled".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(SolaceError::PersistenceFailed("storage disabled".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn manager() -> (KeyManager, Arc<DeviceState>) {
        let state = Arc::new(DeviceState::new(Arc::new(MemoryLocalStore::new())));
        (
            KeyManager::new(Arc::clone(&state), Arc::new(SystemCrypto)),
            state,
        )
    }

    #[test]
    fn test_device_key_is_created_once() {
        let (manager, state) = manager();
        let first = manager.get_or_create_device_key().unwrap();
        let second = manager.get_or_create_device_key().unwrap();

        assert_eq!(first, second);
        assert!(state.exported_key().unwrap().is_some());
    }

    #[test]
    fn test_store_failure_is_key_unavailable() {
        let state = Arc::new(DeviceState::new(Arc::new(BrokenStore)));
        let manager = KeyManager::new(state, Arc::new(SystemCrypto));

        let err = manager.get_or_create_device_key().unwrap_err();
        assert!(matches!(err, SolaceError::KeyUnavailable(_)));
    }

    #[test]
    fn test_corrupt_stored_key_is_not_replaced() {
        let (manager, state) = manager();
        state.local().set(keys::ENCRYPTION_KEY, "not a key").unwrap();

        assert!(matches!(
            manager.get_or_create_device_key(),
            Err(SolaceError::KeyUnavailable(_))
        ));
        assert_eq!(
            state.exported_key().unwrap().as_deref(),
            Some("not a key")
        );
    }

    #[test]
    fn test_password_key_reuses_salt() {
        let (manager, _state) = manager();
        assert!(!manager.is_password_protected().unwrap());

        let first = manager.derive_key_from_password("correct horse").unwrap();
        assert!(manager.is_password_protected().unwrap());
        let second = manager.derive_key_from_password("correct horse").unwrap();
        let other = manager.derive_key_from_password("wrong horse").unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_enable_password_validates_and_sets_flag() {
        let (manager, state) = manager();
        assert!(manager.enable_password("short").is_err());
        assert!(!manager.is_password_protected().unwrap());

        manager.enable_password("long enough password").unwrap();
        assert!(state.password_enabled().unwrap());
    }

    #[test]
    fn test_confirm_reset_requires_exact_phrase() {
        assert!(KeyManager::confirm_reset("reset").is_err());
        assert!(KeyManager::confirm_reset("yes").is_err());
        assert!(KeyManager::confirm_reset("RESET").is_ok());
    }

    #[test]
    fn test_reset_key_yields_new_device_key() {
        let (manager, state) = manager();
        let before = manager.get_or_create_device_key().unwrap();
        manager.enable_password("long enough password").unwrap();

        manager
            .reset_key(KeyManager::confirm_reset(RESET_PHRASE).unwrap())
            .unwrap();

        assert!(!manager.is_password_protected().unwrap());
        assert!(!state.password_enabled().unwrap());
        let after = manager.get_or_create_device_key().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_device_mode_on_protected_device_fails_fast() {
        let (manager, _state) = manager();
        manager.enable_password("long enough password").unwrap();

        let err = manager.resolve(&KeySource::Device).unwrap_err();
        assert!(matches!(err, SolaceError::KeyUnavailable(_)));

        let material = manager
            .resolve(&KeySource::password("long enough password"))
            .unwrap();
        assert!(material.salt.is_some());
    }

    #[test]
    fn test_key_source_debug_redacts_password() {
        let debug = format!("{:?}", KeySource::password("hunter22hunter22"));
        assert!(!debug.contains("hunter22"));
    }
}
