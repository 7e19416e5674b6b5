//! SQLite-backed local store.
//!
//! A single `kv` table holds every local collection as a JSON string, the
//! same shape a browser's local storage would hold. Journal content inside
//! these values is already ciphertext; SQLite only ever sees packages.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::traits::LocalStore;
use crate::error::{Result, SolaceError};

/// Schema version written to `meta` on creation.
const SCHEMA_VERSION: &str = "1";

/// Local store persisted in a SQLite file.
pub struct SqliteLocalStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteLocalStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SolaceError::PersistenceFailed(format!(
                        "Failed to create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let store = Self::initialize(Connection::open(path)?, Some(path.to_path_buf()))?;
        set_owner_only_permissions(path);
        Ok(store)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?, None)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> Result<String> {
        let conn = self.lock_conn()?;
        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        version.ok_or_else(|| {
            SolaceError::PersistenceFailed("Store is missing its schema version".to_string())
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SolaceError::PersistenceFailed("SQLite connection poisoned".to_string()))
    }
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteLocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLocalStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn set_owner_only_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o600);
            if let Err(err) = std::fs::set_permissions(path, perms) {
                tracing::warn!(path = %path.display(), error = %err, "could not restrict store permissions");
            }
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove_in_memory() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        assert_eq!(store.get("mood_history").unwrap(), None);

        store.set("mood_history", "[]").unwrap();
        store.set("mood_history", "[1]").unwrap();
        assert_eq!(store.get("mood_history").unwrap().as_deref(), Some("[1]"));

        store.remove("mood_history").unwrap();
        assert_eq!(store.get("mood_history").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("solace.db");

        {
            let store = SqliteLocalStore::open(&path).unwrap();
            store.set("migrated_to_remote", "true").unwrap();
        }

        let reopened = SqliteLocalStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("migrated_to_remote").unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(reopened.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(reopened.path(), Some(path.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solace.db");
        let _store = SqliteLocalStore::open(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
