//! Storage abstraction for Solace.
//!
//! This module defines the store traits and the record types shared by the
//! local and remote backends.
//!
//! ## Architecture
//!
//! - `LocalStore`: synchronous key-value persistence on the device
//!   (`SqliteLocalStore`, `MemoryLocalStore`)
//! - `RemoteStore`: asynchronous document store per user namespace
//!   (`DirRemoteStore`, `MemoryRemoteStore`)
//!
//! ## Security
//!
//! Stores only ever receive ciphertext packages for journal content. Mood
//! and settings records are stored as plain JSON.

pub mod keys;
pub mod memory;
pub mod remote_dir;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use memory::{MemoryLocalStore, MemoryRemoteStore};
pub use remote_dir::DirRemoteStore;
pub use sqlite::SqliteLocalStore;
pub use traits::{LocalStore, RemoteStore};
pub use types::{
    EncryptedRecord, JournalEntry, JournalEntryView, MoodEntry, MoodLevel, MoodTag, RecordId,
    UserProfile, UserSettings, UNDECRYPTABLE_CONTENT,
};
