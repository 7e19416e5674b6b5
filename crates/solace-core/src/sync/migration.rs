//! One-time migration of local collections into the remote store.
//!
//! Every write is keyed (journal and chat ids, mood days), so an interrupted
//! run can simply be started again. The migration flag is only set once a run
//! finishes with no retryable failures.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use super::{remote_failure, BackendMode, Orchestrator};
use crate::error::{ErrorKind, Result, SolaceError};
use crate::storage::keys;
use crate::storage::{
    EncryptedRecord, MoodEntry, RecordId, RemoteStore, UserProfile, UserSettings,
};

/// One record that did not make it to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub id: Option<RecordId>,
    pub kind: ErrorKind,
    pub message: String,
}

impl RecordFailure {
    pub(crate) fn new(id: Option<RecordId>, err: &SolaceError) -> Self {
        Self {
            id,
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Whether running the migration again could succeed for this record.
    ///
    /// Malformed records never will, so they do not hold the migration open.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::PersistenceFailed | ErrorKind::CryptoUnavailable | ErrorKind::KeyUnavailable
        )
    }
}

/// Outcome for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    /// Records written to the remote store.
    pub migrated: usize,
    /// Records left alone because the remote already had them.
    pub skipped: usize,
    /// Journal records copied without re-sealing because the active key
    /// cannot open them. Included in `migrated`.
    pub copied_unreadable: usize,
    pub failures: Vec<RecordFailure>,
}

impl CollectionReport {
    fn fail(&mut self, id: Option<RecordId>, err: &SolaceError) {
        warn!(id = ?id.as_ref().map(RecordId::as_str), error = %err, "record not migrated");
        self.failures.push(RecordFailure::new(id, err));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// The flag was already set; nothing was read or written.
    pub already_migrated: bool,
    /// The flag is now set and the remote store is the active backend.
    pub completed: bool,
    pub journal: CollectionReport,
    pub moods: CollectionReport,
    pub settings: CollectionReport,
    pub chats: CollectionReport,
}

impl MigrationReport {
    pub fn failures(&self) -> impl Iterator<Item = &RecordFailure> {
        self.journal
            .failures
            .iter()
            .chain(&self.moods.failures)
            .chain(&self.settings.failures)
            .chain(&self.chats.failures)
    }

    pub fn migrated(&self) -> usize {
        self.journal.migrated + self.moods.migrated + self.settings.migrated + self.chats.migrated
    }

    fn has_retryable_failures(&self) -> bool {
        self.failures().any(RecordFailure::is_retryable)
    }
}

impl Orchestrator {
    /// Copy every local collection into the remote store, then switch to it.
    ///
    /// Journal records are opened with the active key and sealed again on
    /// the way out. Records the key cannot open are copied unchanged so they
    /// stay visible as placeholders. Mood entries go through a day-keyed upsert in which an
    /// existing remote entry for that day wins. Settings and chats are copied
    /// as they are.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailed` without touching the flag when no remote
    /// is attached or reachable, and propagates errors reading the local
    /// collections. Per-record failures are collected in the report instead.
    pub async fn migrate_local_to_remote(&mut self) -> Result<MigrationReport> {
        if self.state.is_migrated()? {
            if self.remote.is_some() {
                self.mode = BackendMode::RemoteActive;
            }
            return Ok(MigrationReport {
                already_migrated: true,
                ..MigrationReport::default()
            });
        }

        let remote = self.remote.clone().ok_or_else(|| {
            SolaceError::PersistenceFailed("No remote store is configured".to_string())
        })?;
        remote.ping().await.map_err(remote_failure)?;

        if let Err(err) = self.legacy_plaintext_migration().await {
            warn!(error = %err, "legacy journal migration failed before remote migration");
        }

        let journal: Vec<EncryptedRecord> =
            self.state.read_collection(keys::JOURNAL_ENTRIES_ENCRYPTED)?;
        let moods = self.local_moods()?;
        let settings = self.local_settings_for_migration()?;
        let chats: Vec<serde_json::Value> = self.state.read_collection(keys::CHATS)?;
        info!(
            journal = journal.len(),
            moods = moods.len(),
            chats = chats.len(),
            "migrating local data to remote"
        );

        let profile = UserProfile {
            device_id: self.state.device_id()?,
            created_at: self.clock.now(),
            last_active: self.clock.now(),
        };
        remote.ensure_user(&profile).await.map_err(remote_failure)?;

        let mut report = MigrationReport {
            journal: self.migrate_journal(remote.as_ref(), &journal).await?,
            moods: self.migrate_moods(remote.as_ref(), &moods).await?,
            ..MigrationReport::default()
        };

        if let Some(settings) = settings {
            match remote.put_settings(&settings).await {
                Ok(()) => report.settings.migrated += 1,
                Err(err) => report.settings.fail(None, &remote_failure(err)),
            }
        }

        for chat in &chats {
            let Some(id) = chat_id(chat) else {
                let err = SolaceError::InvalidInput("Chat document has no id".to_string());
                report.chats.fail(None, &err);
                continue;
            };
            match remote.put_chat(&id, chat).await {
                Ok(()) => report.chats.migrated += 1,
                Err(err) => report.chats.fail(Some(id), &remote_failure(err)),
            }
        }

        if report.has_retryable_failures() {
            warn!(
                failures = report.failures().count(),
                "migration incomplete; it will run again next time"
            );
            return Ok(report);
        }

        self.state.mark_migrated()?;
        self.mode = BackendMode::RemoteActive;
        report.completed = true;
        info!(migrated = report.migrated(), "migration complete");
        Ok(report)
    }

    /// The settings document, with the standalone API key filling a missing
    /// `api_key`.
    fn local_settings_for_migration(&self) -> Result<Option<UserSettings>> {
        let settings: Option<UserSettings> = self.state.read_json(keys::USER_SETTINGS)?;
        let Some(api_key) = self.state.standalone_api_key()? else {
            return Ok(settings);
        };
        let mut settings = settings.unwrap_or_default();
        if settings.api_key.is_none() {
            settings.api_key = Some(api_key);
        }
        Ok(Some(settings))
    }

    async fn migrate_journal(
        &self,
        remote: &dyn RemoteStore,
        records: &[EncryptedRecord],
    ) -> Result<CollectionReport> {
        let mut report = CollectionReport::default();
        if records.is_empty() {
            return Ok(report);
        }

        let key = match self.active_key() {
            Ok(key) => key,
            Err(err) => {
                for record in records {
                    report.fail(Some(record.id.clone()), &err);
                }
                return Ok(report);
            }
        };

        for record in records {
            let (outgoing, unreadable) = match self.cipher.open_entry(&record.encrypted, &key) {
                Ok(entry) => {
                    let created_at = record.created_at.unwrap_or(record.timestamp);
                    match self.seal_record(&entry, &key, created_at) {
                        Ok(sealed) => (sealed, false),
                        Err(err) => {
                            report.fail(Some(record.id.clone()), &err);
                            continue;
                        }
                    }
                }
                // Ciphertext the key cannot open still belongs to the user.
                Err(SolaceError::DecryptionFailed(_) | SolaceError::Serialization(_)) => {
                    (record.clone(), true)
                }
                Err(err) => {
                    report.fail(Some(record.id.clone()), &err);
                    continue;
                }
            };
            match remote.put_journal_record(&outgoing).await {
                Ok(()) => {
                    report.migrated += 1;
                    if unreadable {
                        warn!(id = %record.id, "unreadable journal record copied as-is");
                        report.copied_unreadable += 1;
                    }
                }
                Err(err) => report.fail(Some(record.id.clone()), &remote_failure(err)),
            }
        }
        Ok(report)
    }

    async fn migrate_moods(
        &self,
        remote: &dyn RemoteStore,
        entries: &[MoodEntry],
    ) -> Result<CollectionReport> {
        let mut report = CollectionReport::default();
        if entries.is_empty() {
            return Ok(report);
        }

        let clock = self.clock.as_ref();
        let mut seen_days: HashSet<_> = remote
            .list_mood_entries()
            .await
            .map_err(remote_failure)?
            .iter()
            .map(|entry| clock.local_date(entry.timestamp))
            .collect();

        for entry in entries {
            let day = clock.local_date(entry.timestamp);
            if seen_days.contains(&day) {
                report.skipped += 1;
                continue;
            }
            let mut outgoing = entry.clone();
            outgoing.id = None;
            match remote.add_mood_entry(&outgoing).await {
                Ok(_) => {
                    seen_days.insert(day);
                    report.migrated += 1;
                }
                Err(err) => report.fail(None, &remote_failure(err)),
            }
        }
        Ok(report)
    }
}

/// The `id` of an opaque chat document, string or number.
fn chat_id(chat: &serde_json::Value) -> Option<RecordId> {
    match chat.get("id")? {
        serde_json::Value::String(id) if !id.is_empty() => Some(RecordId::from(id.as_str())),
        serde_json::Value::Number(id) => Some(RecordId::from(id.to_string())),
        _ => None,
    }
}
