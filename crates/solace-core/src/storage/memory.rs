//! In-memory store implementations.
//!
//! `MemoryLocalStore` and `MemoryRemoteStore` back the test suites and are
//! usable by embedders that want an ephemeral session. The remote store can be
//! switched offline or told to reject specific journal writes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::{LocalStore, RemoteStore};
use super::types::{EncryptedRecord, MoodEntry, RecordId, UserProfile, UserSettings};
use crate::error::{Result, SolaceError};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| SolaceError::PersistenceFailed("In-memory store poisoned".to_string()))
}

/// Volatile key-value store.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.values)
            .map(|values| values.contains_key(key))
            .unwrap_or(false)
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.values)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.values)?.remove(key);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Collections {
    profile: Option<UserProfile>,
    journal: BTreeMap<RecordId, EncryptedRecord>,
    moods: BTreeMap<RecordId, MoodEntry>,
    settings: Option<UserSettings>,
    chats: BTreeMap<RecordId, serde_json::Value>,
    next_mood_id: u64,
    writes: usize,
}

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    rejected_journal_ids: HashSet<RecordId>,
}

/// Volatile document store with fault injection.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    collections: Mutex<Collections>,
    faults: Mutex<Faults>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.offline = offline;
        }
    }

    /// Reject writes of the journal record with this id.
    pub fn reject_journal_writes_for(&self, id: RecordId) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.rejected_journal_ids.insert(id);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            *faults = Faults::default();
        }
    }

    pub fn journal_records(&self) -> Vec<EncryptedRecord> {
        self.snapshot(|c| c.journal.values().cloned().collect())
    }

    pub fn mood_entries(&self) -> Vec<MoodEntry> {
        self.snapshot(|c| c.moods.values().cloned().collect())
    }

    pub fn settings(&self) -> Option<UserSettings> {
        self.snapshot(|c| c.settings.clone())
    }

    pub fn chats(&self) -> Vec<serde_json::Value> {
        self.snapshot(|c| c.chats.values().cloned().collect())
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.snapshot(|c| c.profile.clone())
    }

    /// Number of successful write calls so far.
    pub fn write_count(&self) -> usize {
        self.snapshot(|c| c.writes)
    }

    fn snapshot<T: Default>(&self, read: impl FnOnce(&Collections) -> T) -> T {
        self.collections
            .lock()
            .map(|collections| read(&collections))
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<()> {
        if lock(&self.faults)?.offline {
            return Err(SolaceError::PersistenceFailed(
                "Remote store unreachable".to_string(),
            ));
        }
        Ok(())
    }

    fn write<T>(&self, apply: impl FnOnce(&mut Collections) -> T) -> Result<T> {
        self.check_online()?;
        let mut collections = lock(&self.collections)?;
        collections.writes += 1;
        Ok(apply(&mut collections))
    }

    fn read<T>(&self, read: impl FnOnce(&Collections) -> T) -> Result<T> {
        self.check_online()?;
        let collections = lock(&self.collections)?;
        Ok(read(&collections))
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn ping(&self) -> Result<()> {
        self.check_online()
    }

    async fn ensure_user(&self, profile: &UserProfile) -> Result<()> {
        self.write(|c| {
            let created_at = c
                .profile
                .as_ref()
                .map(|existing| existing.created_at)
                .unwrap_or(profile.created_at);
            c.profile = Some(UserProfile {
                created_at,
                ..profile.clone()
            });
        })
    }

    async fn put_journal_record(&self, record: &EncryptedRecord) -> Result<()> {
        if lock(&self.faults)?.rejected_journal_ids.contains(&record.id) {
            return Err(SolaceError::PersistenceFailed(format!(
                "Remote rejected journal record {}",
                record.id
            )));
        }
        self.write(|c| {
            c.journal.insert(record.id.clone(), record.clone());
        })
    }

    async fn list_journal_records(&self) -> Result<Vec<EncryptedRecord>> {
        self.read(|c| c.journal.values().cloned().collect())
    }

    async fn add_mood_entry(&self, entry: &MoodEntry) -> Result<RecordId> {
        self.write(|c| {
            c.next_mood_id += 1;
            let id = RecordId::from(format!("mood-{:06}", c.next_mood_id));
            let mut stored = entry.clone();
            stored.id = Some(id.clone());
            c.moods.insert(id.clone(), stored);
            id
        })
    }

    async fn update_mood_entry(&self, id: &RecordId, entry: &MoodEntry) -> Result<()> {
        self.write(|c| {
            let mut stored = entry.clone();
            stored.id = Some(id.clone());
            c.moods.insert(id.clone(), stored);
        })
    }

    async fn list_mood_entries(&self) -> Result<Vec<MoodEntry>> {
        self.read(|c| c.moods.values().cloned().collect())
    }

    async fn put_settings(&self, settings: &UserSettings) -> Result<()> {
        self.write(|c| c.settings = Some(settings.clone()))
    }

    async fn get_settings(&self) -> Result<Option<UserSettings>> {
        self.read(|c| c.settings.clone())
    }

    async fn put_chat(&self, id: &RecordId, chat: &serde_json::Value) -> Result<()> {
        self.write(|c| {
            c.chats.insert(id.clone(), chat.clone());
        })
    }

    async fn list_chats(&self) -> Result<Vec<serde_json::Value>> {
        self.read(|c| c.chats.values().cloned().collect())
    }
}
