//! Local store key names.

/// Encrypted journal records: `[{id, encrypted, timestamp, createdAt?}]`.
pub const JOURNAL_ENTRIES_ENCRYPTED: &str = "journal_entries_encrypted";

/// Plaintext journal entries written before encryption existed.
pub const LEGACY_JOURNAL_ENTRIES: &str = "journal_entries";

/// Mood check-ins: `[{mood, timestamp, chatId?, updatedAt?}]`.
pub const MOOD_HISTORY: &str = "mood_history";

pub const USER_SETTINGS: &str = "user_settings";

/// Bare API key string kept outside the settings document by older installs.
pub const GEMINI_API_KEY: &str = "gemini_api_key";

/// Opaque chat documents, each carrying an `id`.
pub const CHATS: &str = "chats";

/// Exported device key (JWK-like JSON).
pub const ENCRYPTION_KEY: &str = "journal_encryption_key";

/// Base64 salt for the password-derived key.
pub const KEY_SALT: &str = "journal_key_salt";

pub const PASSWORD_ENABLED: &str = "journal_password_enabled";

pub const MIGRATED_TO_REMOTE: &str = "migrated_to_remote";

pub const DEVICE_ID: &str = "device_id";
