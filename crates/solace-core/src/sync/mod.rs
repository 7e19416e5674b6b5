//! Persistence orchestrator.
//!
//! Every application read and write goes through [`Orchestrator`]. It picks
//! the backend once at construction ([`BackendMode`]), seals journal entries
//! before they reach any store, keeps one mood entry per local day and moves
//! local data to the remote store exactly once.
//!
//! ## Backend selection
//!
//! - `LocalOnly`: all collections live in the local store.
//! - `RemoteActive`: a remote store is attached and the migration flag is set.
//!   Writes go to the remote and surface its failures; reads fall back to the
//!   local copy when the remote cannot be read.
//!
//! The only transition is `LocalOnly -> RemoteActive`, through
//! [`Orchestrator::migrate_local_to_remote`] or [`Orchestrator::skip_migration`].

mod legacy;
mod migration;
mod mood;

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::crypto::{
    CryptoProvider, KeyManager, KeySource, RecordCipher, ResetConfirmation, SymmetricKey,
    SystemCrypto,
};
use crate::error::{Result, SolaceError};
use crate::state::DeviceState;
use crate::storage::keys;
use crate::storage::{EncryptedRecord, JournalEntry, JournalEntryView, RemoteStore, UserSettings};

pub use legacy::LegacyMigrationReport;
pub use migration::{CollectionReport, MigrationReport, RecordFailure};

/// Which backend serves reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    LocalOnly,
    RemoteActive,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendMode::LocalOnly => f.write_str("local only"),
            BackendMode::RemoteActive => f.write_str("remote active"),
        }
    }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    state: Arc<DeviceState>,
    remote: Option<Arc<dyn RemoteStore>>,
    key_source: KeySource,
    clock: Arc<dyn Clock>,
    crypto: Arc<dyn CryptoProvider>,
}

impl OrchestratorBuilder {
    /// Attach a remote store. Without one the orchestrator stays local-only.
    pub fn remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn key_source(mut self, key_source: KeySource) -> Self {
        self.key_source = key_source;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn crypto(mut self, crypto: Arc<dyn CryptoProvider>) -> Self {
        self.crypto = crypto;
        self
    }

    /// Read the migration flag and fix the backend mode.
    pub fn build(self) -> Result<Orchestrator> {
        let mode = if self.remote.is_some() && self.state.is_migrated()? {
            BackendMode::RemoteActive
        } else {
            BackendMode::LocalOnly
        };
        debug!(%mode, "orchestrator ready");

        Ok(Orchestrator {
            keys: KeyManager::new(Arc::clone(&self.state), Arc::clone(&self.crypto)),
            cipher: RecordCipher::new(self.crypto),
            state: self.state,
            remote: self.remote,
            key_source: self.key_source,
            clock: self.clock,
            mode,
            key_cache: Mutex::new(None),
        })
    }
}

pub struct Orchestrator {
    state: Arc<DeviceState>,
    keys: KeyManager,
    cipher: RecordCipher,
    remote: Option<Arc<dyn RemoteStore>>,
    key_source: KeySource,
    clock: Arc<dyn Clock>,
    mode: BackendMode,
    key_cache: Mutex<Option<SymmetricKey>>,
}

impl Orchestrator {
    /// Start building an orchestrator over `state`, with device keys, the
    /// system clock and the system crypto provider by default.
    pub fn builder(state: Arc<DeviceState>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            state,
            remote: None,
            key_source: KeySource::Device,
            clock: Arc::new(SystemClock),
            crypto: Arc::new(SystemCrypto),
        }
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    pub fn device_id(&self) -> Result<String> {
        self.state.device_id()
    }

    /// Whether a remote store is attached and answers a ping.
    pub async fn remote_available(&self) -> bool {
        match &self.remote {
            Some(remote) => remote.ping().await.is_ok(),
            None => false,
        }
    }

    /// The remote store, if it is the active backend.
    fn active_remote(&self) -> Option<&dyn RemoteStore> {
        match self.mode {
            BackendMode::RemoteActive => self.remote.as_deref(),
            BackendMode::LocalOnly => None,
        }
    }

    /// The resolved journal key, cached for the orchestrator's lifetime.
    fn active_key(&self) -> Result<SymmetricKey> {
        let mut cache = self
            .key_cache
            .lock()
            .map_err(|_| SolaceError::KeyUnavailable("Key cache poisoned".to_string()))?;
        if let Some(key) = cache.as_ref() {
            return Ok(key.clone());
        }
        let material = self.keys.resolve(&self.key_source)?;
        *cache = Some(material.key.clone());
        Ok(material.key)
    }

    fn clear_key_cache(&self) {
        if let Ok(mut cache) = self.key_cache.lock() {
            *cache = None;
        }
    }

    // --- Journal ---

    /// Seal `entry` and write it to the active backend, keyed by its id.
    ///
    /// # Errors
    ///
    /// In `RemoteActive` mode a failed remote write is returned as
    /// `PersistenceFailed`; nothing is written locally instead.
    pub async fn save_journal_entry(&self, entry: &JournalEntry) -> Result<EncryptedRecord> {
        let key = self.active_key()?;
        let record = self.seal_record(entry, &key, self.clock.now())?;
        self.store_record(&record).await?;
        debug!(id = %record.id, "journal entry saved");
        Ok(record)
    }

    fn seal_record(
        &self,
        entry: &JournalEntry,
        key: &SymmetricKey,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<EncryptedRecord> {
        Ok(EncryptedRecord {
            id: entry.id.clone(),
            encrypted: self.cipher.seal_entry(entry, key)?,
            timestamp: entry.timestamp,
            created_at: Some(created_at),
        })
    }

    async fn store_record(&self, record: &EncryptedRecord) -> Result<()> {
        match self.active_remote() {
            Some(remote) => remote
                .put_journal_record(record)
                .await
                .map_err(remote_failure),
            None => self.upsert_local_record(record.clone()),
        }
    }

    fn upsert_local_record(&self, record: EncryptedRecord) -> Result<()> {
        let mut records = self.local_journal()?;
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.state
            .write_json(keys::JOURNAL_ENTRIES_ENCRYPTED, &records)
    }

    fn local_journal(&self) -> Result<Vec<EncryptedRecord>> {
        self.state.read_collection(keys::JOURNAL_ENTRIES_ENCRYPTED)
    }

    async fn journal_records(&self) -> Result<Vec<EncryptedRecord>> {
        match self.active_remote() {
            Some(remote) => match remote.list_journal_records().await {
                Ok(records) => Ok(records),
                Err(err) => {
                    warn!(error = %err, "remote journal read failed, using local copy");
                    self.local_journal()
                }
            },
            None => self.local_journal(),
        }
    }

    /// Load every journal entry, newest first.
    ///
    /// Plaintext entries from older versions are encrypted first. Each record
    /// is decrypted on its own; a record that cannot be opened comes back as
    /// a placeholder view carrying the failure kind.
    pub async fn load_journal_entries(&self) -> Result<Vec<JournalEntryView>> {
        if let Err(err) = self.legacy_plaintext_migration().await {
            warn!(error = %err, "legacy journal migration failed");
        }

        let records = self.journal_records().await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let key = self.active_key()?;

        let mut views: Vec<JournalEntryView> = records
            .iter()
            .map(|record| match self.cipher.open_entry(&record.encrypted, &key) {
                Ok(entry) => JournalEntryView::decrypted(entry),
                Err(err) => {
                    debug!(id = %record.id, error = %err, "journal record could not be opened");
                    JournalEntryView::undecryptable(record, err.kind())
                }
            })
            .collect();

        views.sort_by(|a, b| b.entry.timestamp.cmp(&a.entry.timestamp));
        Ok(views)
    }

    // --- Settings ---

    pub async fn save_settings(&self, settings: &UserSettings) -> Result<UserSettings> {
        let mut stored = settings.clone();
        stored.updated_at = Some(self.clock.now());
        match self.active_remote() {
            Some(remote) => remote.put_settings(&stored).await.map_err(remote_failure)?,
            None => self.state.write_json(keys::USER_SETTINGS, &stored)?,
        }
        Ok(stored)
    }

    pub async fn get_settings(&self) -> Result<Option<UserSettings>> {
        if let Some(remote) = self.active_remote() {
            match remote.get_settings().await {
                Ok(settings) => return Ok(settings),
                Err(err) => warn!(error = %err, "remote settings read failed, using local copy"),
            }
        }
        self.state.read_json(keys::USER_SETTINGS)
    }

    // --- Migration state ---

    /// True until migration has run to completion or been skipped.
    pub fn needs_migration(&self) -> Result<bool> {
        Ok(!self.state.is_migrated()?)
    }

    /// Record that the user declined migration and switch to the remote.
    pub fn skip_migration(&mut self) -> Result<()> {
        self.state.mark_migrated()?;
        if self.remote.is_some() {
            self.mode = BackendMode::RemoteActive;
        }
        debug!(mode = %self.mode, "migration skipped");
        Ok(())
    }

    // --- Key lifecycle ---

    /// Destroy the journal key. Existing records become unreadable.
    pub fn reset_encryption(&self, confirmation: ResetConfirmation) -> Result<()> {
        self.keys.reset_key(confirmation)?;
        self.clear_key_cache();
        Ok(())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("mode", &self.mode)
            .field("key_source", &self.key_source)
            .field("remote", &self.remote.is_some())
            .finish_non_exhaustive()
    }
}

/// Remote failures always reach callers as `PersistenceFailed`.
fn remote_failure(err: SolaceError) -> SolaceError {
    match err {
        SolaceError::PersistenceFailed(_) => err,
        other => SolaceError::PersistenceFailed(format!("Remote store error: {}", other)),
    }
}
