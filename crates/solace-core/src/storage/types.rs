//! Core data types for the storage layer.
//!
//! Field names serialize in camelCase so local and remote documents share one
//! shape (`chatId`, `createdAt`, ...).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{ErrorKind, Result, SolaceError};

/// Content shown in place of a journal entry that could not be decrypted.
pub const UNDECRYPTABLE_CONTENT: &str = "[Encrypted - Unable to decrypt. The encryption key may have been reset or the password is incorrect.]";

/// Opaque record identifier.
///
/// New identifiers are UUIDv7 strings (time-ordered). Older records may carry
/// numeric ids, which deserialize into their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a new time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(value) => RecordId(value),
            Raw::Signed(value) => RecordId(value.to_string()),
            Raw::Unsigned(value) => RecordId(value.to_string()),
        })
    }
}

/// The fixed set of mood levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoodLevel {
    Struggling,
    Low,
    Okay,
    Good,
    Great,
}

impl MoodLevel {
    pub const ALL: [MoodLevel; 5] = [
        MoodLevel::Great,
        MoodLevel::Good,
        MoodLevel::Okay,
        MoodLevel::Low,
        MoodLevel::Struggling,
    ];

    pub fn value(self) -> u8 {
        match self {
            MoodLevel::Struggling => 1,
            MoodLevel::Low => 2,
            MoodLevel::Okay => 3,
            MoodLevel::Good => 4,
            MoodLevel::Great => 5,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.value() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            MoodLevel::Struggling => "Struggling",
            MoodLevel::Low => "Low",
            MoodLevel::Okay => "Okay",
            MoodLevel::Good => "Good",
            MoodLevel::Great => "Great",
        }
    }

    /// Build the tag embedded into entries.
    pub fn tag(self) -> MoodTag {
        let (emoji, color) = match self {
            MoodLevel::Struggling => ("😢", "#ef4444"),
            MoodLevel::Low => ("😔", "#f97316"),
            MoodLevel::Okay => ("😐", "#f59e0b"),
            MoodLevel::Good => ("🙂", "#3b82f6"),
            MoodLevel::Great => ("😊", "#10b981"),
        };
        MoodTag {
            emoji: emoji.to_string(),
            label: self.label().to_string(),
            color: color.to_string(),
            value: self.value(),
        }
    }
}

impl std::str::FromStr for MoodLevel {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Self::from_value(value).ok_or_else(|| {
                SolaceError::InvalidInput(format!("Mood value must be 1-5 (got {})", value))
            });
        }
        Self::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SolaceError::InvalidInput(format!("Unknown mood: {}", trimmed)))
    }
}

/// A mood as embedded by value in journal and mood entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodTag {
    pub emoji: String,
    pub label: String,
    pub color: String,
    pub value: u8,
}

impl MoodTag {
    pub fn level(&self) -> Option<MoodLevel> {
        MoodLevel::from_value(self.value)
    }
}

/// A plaintext journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: RecordId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<MoodTag>,
}

impl JournalEntry {
    /// Create an entry stamped now with a fresh identifier.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: RecordId::generate(),
            content: content.into(),
            timestamp: Utc::now(),
            mood: None,
        }
    }

    pub fn with_mood(mut self, mood: MoodTag) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A journal entry as stored: only the id and timestamp are visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    pub id: RecordId,
    pub encrypted: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A daily mood check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    /// Store-assigned identifier (remote documents only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub mood: MoodTag,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MoodEntry {
    pub fn new(mood: MoodTag, timestamp: DateTime<Utc>, chat_id: Option<RecordId>) -> Self {
        Self {
            id: None,
            mood,
            timestamp,
            chat_id,
            updated_at: None,
        }
    }
}

/// User preferences, including the assistant API key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preferences: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Remote profile document for a user namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// One journal entry as returned by a load.
///
/// Entries that could not be decrypted carry [`UNDECRYPTABLE_CONTENT`] and the
/// kind of failure, so callers can show that data exists but is inaccessible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntryView {
    #[serde(flatten)]
    pub entry: JournalEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl JournalEntryView {
    pub fn decrypted(entry: JournalEntry) -> Self {
        Self { entry, error: None }
    }

    pub fn undecryptable(record: &EncryptedRecord, kind: ErrorKind) -> Self {
        Self {
            entry: JournalEntry {
                id: record.id.clone(),
                content: UNDECRYPTABLE_CONTENT.to_string(),
                timestamp: record.timestamp,
                mood: None,
            },
            error: Some(kind),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
