//! Directory-backed remote document store.
//!
//! Mirrors the remote schema on a shared filesystem (a synced folder or a
//! network mount): one JSON document per record under
//! `<root>/users/<user>/<collection>/<id>.json`. The root must already exist;
//! a missing root means the remote is unreachable.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use super::traits::RemoteStore;
use super::types::{EncryptedRecord, MoodEntry, RecordId, UserProfile, UserSettings};
use crate::error::{Result, SolaceError};
use crate::fs::write_atomic;

const JOURNAL_COLLECTION: &str = "journalEntries";
const MOOD_COLLECTION: &str = "moodHistory";
const SETTINGS_COLLECTION: &str = "settings";
const CHATS_COLLECTION: &str = "chats";
const SETTINGS_DOCUMENT: &str = "preferences";
const PROFILE_DOCUMENT: &str = "profile.json";

/// Remote store rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirRemoteStore {
    root: PathBuf,
    namespace: PathBuf,
}

impl DirRemoteStore {
    /// Create a store for `user_id` under `root`.
    ///
    /// # Errors
    ///
    /// Returns `SolaceError::InvalidInput` if the user id is not a safe path component.
    pub fn new(root: impl Into<PathBuf>, user_id: &str) -> Result<Self> {
        validate_component(user_id)?;
        let root = root.into();
        let namespace = root.join("users").join(user_id);
        Ok(Self { root, namespace })
    }

    pub fn namespace(&self) -> &Path {
        &self.namespace
    }

    fn document_path(&self, collection: &str, id: &str) -> Result<PathBuf> {
        validate_component(id)?;
        Ok(self
            .namespace
            .join(collection)
            .join(format!("{}.json", id)))
    }

    async fn write_document<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        write_atomic(path, &data).await.map_err(|e| {
            SolaceError::PersistenceFailed(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    async fn read_document<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SolaceError::PersistenceFailed(format!(
                "Failed to read {}: {}",
                path.display(),
                err
            ))),
        }
    }

    /// Read every document in a collection, keeping per-document failures.
    async fn read_collection<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<(PathBuf, String, Result<T>)>> {
        self.ping().await?;
        let dir = self.namespace.join(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(SolaceError::PersistenceFailed(format!(
                    "Failed to list {}: {}",
                    dir.display(),
                    err
                )))
            }
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(stem) = document_stem(&path) else {
                continue;
            };
            match self.read_document::<T>(&path).await {
                Ok(Some(value)) => documents.push((path, stem, Ok(value))),
                Ok(None) => {}
                Err(err) => documents.push((path, stem, Err(err))),
            }
        }
        Ok(documents)
    }

    /// Like [`Self::read_collection`], dropping documents that fail to parse.
    async fn read_parseable<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, T)>> {
        Ok(self
            .read_collection::<T>(collection)
            .await?
            .into_iter()
            .filter_map(|(path, stem, value)| match value {
                Ok(value) => Some((stem, value)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable remote document");
                    None
                }
            })
            .collect())
    }
}

/// Stand-in for a journal document that no longer parses.
///
/// The empty package never opens, so the entry loads as a placeholder instead
/// of disappearing.
async fn damaged_record(path: &Path, stem: String) -> EncryptedRecord {
    let timestamp = fs::metadata(path)
        .await
        .and_then(|metadata| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_default();
    EncryptedRecord {
        id: RecordId::from(stem),
        encrypted: String::new(),
        timestamp,
        created_at: None,
    }
}

#[async_trait]
impl RemoteStore for DirRemoteStore {
    async fn ping(&self) -> Result<()> {
        match fs::metadata(&self.root).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(SolaceError::PersistenceFailed(format!(
                "Remote root is not a directory: {}",
                self.root.display()
            ))),
            Err(err) => Err(SolaceError::PersistenceFailed(format!(
                "Remote root unreachable {}: {}",
                self.root.display(),
                err
            ))),
        }
    }

    async fn ensure_user(&self, profile: &UserProfile) -> Result<()> {
        self.ping().await?;
        let path = self.namespace.join(PROFILE_DOCUMENT);
        let existing: Option<UserProfile> = self.read_document(&path).await.unwrap_or(None);
        let merged = UserProfile {
            created_at: existing
                .map(|existing| existing.created_at)
                .unwrap_or(profile.created_at),
            ..profile.clone()
        };
        self.write_document(&path, &merged).await
    }

    async fn put_journal_record(&self, record: &EncryptedRecord) -> Result<()> {
        self.ping().await?;
        let path = self.document_path(JOURNAL_COLLECTION, record.id.as_str())?;
        self.write_document(&path, record).await
    }

    async fn list_journal_records(&self) -> Result<Vec<EncryptedRecord>> {
        let documents = self
            .read_collection::<EncryptedRecord>(JOURNAL_COLLECTION)
            .await?;
        let mut records = Vec::with_capacity(documents.len());
        for (path, stem, record) in documents {
            match record {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "journal document is damaged");
                    records.push(damaged_record(&path, stem).await);
                }
            }
        }
        Ok(records)
    }

    async fn add_mood_entry(&self, entry: &MoodEntry) -> Result<RecordId> {
        self.ping().await?;
        let id = RecordId::from(Uuid::new_v4().simple().to_string());
        let mut stored = entry.clone();
        stored.id = None;
        let path = self.document_path(MOOD_COLLECTION, id.as_str())?;
        self.write_document(&path, &stored).await?;
        Ok(id)
    }

    async fn update_mood_entry(&self, id: &RecordId, entry: &MoodEntry) -> Result<()> {
        self.ping().await?;
        let mut stored = entry.clone();
        stored.id = None;
        let path = self.document_path(MOOD_COLLECTION, id.as_str())?;
        self.write_document(&path, &stored).await
    }

    async fn list_mood_entries(&self) -> Result<Vec<MoodEntry>> {
        Ok(self
            .read_parseable::<MoodEntry>(MOOD_COLLECTION)
            .await?
            .into_iter()
            .map(|(id, mut entry)| {
                entry.id = Some(RecordId::from(id));
                entry
            })
            .collect())
    }

    async fn put_settings(&self, settings: &UserSettings) -> Result<()> {
        self.ping().await?;
        let path = self.document_path(SETTINGS_COLLECTION, SETTINGS_DOCUMENT)?;
        self.write_document(&path, settings).await
    }

    async fn get_settings(&self) -> Result<Option<UserSettings>> {
        self.ping().await?;
        let path = self.document_path(SETTINGS_COLLECTION, SETTINGS_DOCUMENT)?;
        self.read_document(&path).await
    }

    async fn put_chat(&self, id: &RecordId, chat: &serde_json::Value) -> Result<()> {
        self.ping().await?;
        let path = self.document_path(CHATS_COLLECTION, id.as_str())?;
        self.write_document(&path, chat).await
    }

    async fn list_chats(&self) -> Result<Vec<serde_json::Value>> {
        Ok(self
            .read_parseable::<serde_json::Value>(CHATS_COLLECTION)
            .await?
            .into_iter()
            .map(|(_, chat)| chat)
            .collect())
    }
}

fn document_stem(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}

fn validate_component(value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value.len() <= 128
        && !value.starts_with('.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(SolaceError::InvalidInput(format!(
            "Invalid remote document id: {:?}",
            value
        )))
    }
}
