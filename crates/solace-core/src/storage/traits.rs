//! Store trait definitions.
//!
//! Two seams: a synchronous key-value [`LocalStore`] on the device, and an
//! asynchronous document [`RemoteStore`] namespaced to one user identity.
//! The orchestrator is written against these traits only.

use async_trait::async_trait;

use super::types::{EncryptedRecord, MoodEntry, RecordId, UserProfile, UserSettings};
use crate::error::Result;

/// Durable key-value persistence on the user's device.
///
/// Values are JSON strings. Implementations must make `set` durable before
/// returning; there is no separate flush step.
pub trait LocalStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Multi-device document store, scoped to one user namespace.
///
/// All errors surface as `SolaceError::PersistenceFailed`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Create or refresh the namespace profile document.
    async fn ensure_user(&self, profile: &UserProfile) -> Result<()>;

    // --- Journal (ciphertext only) ---

    /// Insert or replace a journal record keyed by its id.
    async fn put_journal_record(&self, record: &EncryptedRecord) -> Result<()>;

    /// List all journal records, in no particular order.
    async fn list_journal_records(&self) -> Result<Vec<EncryptedRecord>>;

    // --- Mood history ---

    /// Add a mood entry; the store assigns and returns its id.
    async fn add_mood_entry(&self, entry: &MoodEntry) -> Result<RecordId>;

    /// Replace the mood entry with the given id.
    async fn update_mood_entry(&self, id: &RecordId, entry: &MoodEntry) -> Result<()>;

    /// List all mood entries with their ids populated.
    async fn list_mood_entries(&self) -> Result<Vec<MoodEntry>>;

    // --- Settings ---

    async fn put_settings(&self, settings: &UserSettings) -> Result<()>;

    async fn get_settings(&self) -> Result<Option<UserSettings>>;

    // --- Chats (opaque documents) ---

    async fn put_chat(&self, id: &RecordId, chat: &serde_json::Value) -> Result<()>;

    async fn list_chats(&self) -> Result<Vec<serde_json::Value>>;
}
