//! Device-scoped persistent state.
//!
//! [`DeviceState`] is the single owner of the values that outlive one
//! operation: key material, the migration flag and the device id. It is
//! created by the application root and shared into the key manager and the
//! orchestrator.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::crypto::key::SALT_LENGTH;
use crate::error::{Result, SolaceError};
use crate::storage::keys;
use crate::storage::LocalStore;

pub struct DeviceState {
    store: Arc<dyn LocalStore>,
}

impl DeviceState {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// The underlying local store.
    pub fn local(&self) -> &dyn LocalStore {
        self.store.as_ref()
    }

    /// Read and parse a JSON value.
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                SolaceError::Serialization(format!("Local value {} is malformed: {}", key, e))
            }),
            None => Ok(None),
        }
    }

    /// Serialize and store a JSON value.
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    /// Read a JSON array collection; absent means empty.
    pub fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.read_json::<Vec<T>>(key)?.unwrap_or_default())
    }

    /// The API key stored as a bare string, if any.
    pub fn standalone_api_key(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(keys::GEMINI_API_KEY)?
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty()))
    }

    // --- Migration flag ---

    pub fn is_migrated(&self) -> Result<bool> {
        Ok(self.store.get(keys::MIGRATED_TO_REMOTE)?.as_deref() == Some("true"))
    }

    pub fn mark_migrated(&self) -> Result<()> {
        self.store.set(keys::MIGRATED_TO_REMOTE, "true")
    }

    // --- Device identity ---

    /// The device id, generated and persisted on first use.
    pub fn device_id(&self) -> Result<String> {
        if let Some(existing) = self.store.get(keys::DEVICE_ID)? {
            if !existing.trim().is_empty() {
                return Ok(existing);
            }
        }
        let device_id = format!("device_{}", Uuid::new_v4().simple());
        self.store.set(keys::DEVICE_ID, &device_id)?;
        Ok(device_id)
    }

    // --- Key material ---

    pub(crate) fn exported_key(&self) -> Result<Option<String>> {
        self.store.get(keys::ENCRYPTION_KEY)
    }

    pub(crate) fn set_exported_key(&self, exported: &str) -> Result<()> {
        self.store.set(keys::ENCRYPTION_KEY, exported)
    }

    pub(crate) fn salt(&self) -> Result<Option<[u8; SALT_LENGTH]>> {
        let Some(encoded) = self.store.get(keys::KEY_SALT)? else {
            return Ok(None);
        };
        let raw = STANDARD
            .decode(encoded.trim().as_bytes())
            .map_err(|e| SolaceError::KeyUnavailable(format!("Stored salt is not base64: {}", e)))?;
        let salt: [u8; SALT_LENGTH] = raw.as_slice().try_into().map_err(|_| {
            SolaceError::KeyUnavailable(format!(
                "Stored salt must be {} bytes (got {})",
                SALT_LENGTH,
                raw.len()
            ))
        })?;
        Ok(Some(salt))
    }

    pub(crate) fn set_salt(&self, salt: &[u8; SALT_LENGTH]) -> Result<()> {
        self.store.set(keys::KEY_SALT, &STANDARD.encode(salt))
    }

    pub(crate) fn set_password_enabled(&self) -> Result<()> {
        self.store.set(keys::PASSWORD_ENABLED, "true")
    }

    pub fn password_enabled(&self) -> Result<bool> {
        Ok(self.store.get(keys::PASSWORD_ENABLED)?.as_deref() == Some("true"))
    }

    /// Delete the key, the salt and the password flag.
    pub(crate) fn clear_key_material(&self) -> Result<()> {
        self.store.remove(keys::ENCRYPTION_KEY)?;
        self.store.remove(keys::KEY_SALT)?;
        self.store.remove(keys::PASSWORD_ENABLED)
    }
}

impl std::fmt::Debug for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceState").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLocalStore;

    fn state() -> DeviceState {
        DeviceState::new(Arc::new(MemoryLocalStore::new()))
    }

    #[test]
    fn test_migration_flag_defaults_to_unset() {
        let state = state();
        assert!(!state.is_migrated().unwrap());
        state.mark_migrated().unwrap();
        assert!(state.is_migrated().unwrap());
    }

    #[test]
    fn test_device_id_is_stable() {
        let state = state();
        let first = state.device_id().unwrap();
        assert!(first.starts_with("device_"));
        assert_eq!(state.device_id().unwrap(), first);
    }

    #[test]
    fn test_salt_round_trip_and_clear() {
        let state = state();
        assert_eq!(state.salt().unwrap(), None);

        let salt = [9u8; SALT_LENGTH];
        state.set_salt(&salt).unwrap();
        state.set_password_enabled().unwrap();
        state.set_exported_key("{}").unwrap();
        assert_eq!(state.salt().unwrap(), Some(salt));

        state.clear_key_material().unwrap();
        assert_eq!(state.salt().unwrap(), None);
        assert_eq!(state.exported_key().unwrap(), None);
        assert!(!state.password_enabled().unwrap());
    }

    #[test]
    fn test_malformed_salt_is_key_unavailable() {
        let state = state();
        state.local().set(keys::KEY_SALT, "c2hvcnQ=").unwrap();
        assert!(matches!(
            state.salt(),
            Err(SolaceError::KeyUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_collection_is_serialization_error() {
        let state = state();
        state.local().set(keys::MOOD_HISTORY, "{oops").unwrap();
        let result = state.read_collection::<serde_json::Value>(keys::MOOD_HISTORY);
        assert!(matches!(result, Err(SolaceError::Serialization(_))));
    }
}
