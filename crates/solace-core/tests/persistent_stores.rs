use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use solace_core::storage::{DirRemoteStore, JournalEntry, MoodLevel, SqliteLocalStore};
use solace_core::storage::UNDECRYPTABLE_CONTENT;
use solace_core::{BackendMode, DeviceState, ErrorKind, KeySource, Orchestrator};

struct Paths {
    dir: TempDir,
}

impl Paths {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir should be created"),
        }
    }

    fn state(&self) -> Arc<DeviceState> {
        let store = SqliteLocalStore::open(&self.dir.path().join("local").join("solace.db"))
            .expect("open should succeed");
        Arc::new(DeviceState::new(Arc::new(store)))
    }

    fn remote(&self) -> Arc<DirRemoteStore> {
        let root = self.dir.path().join("remote");
        fs::create_dir_all(&root).expect("remote root should be created");
        Arc::new(DirRemoteStore::new(root, "device_test").expect("user id is valid"))
    }
}

#[tokio::test]
async fn test_local_data_survives_reopen() {
    let paths = Paths::new();
    let entry = JournalEntry::new("kept across restarts");

    {
        let orchestrator = Orchestrator::builder(paths.state()).build().unwrap();
        orchestrator.save_journal_entry(&entry).await.unwrap();
        orchestrator
            .save_mood_entry(MoodLevel::Okay, None)
            .await
            .unwrap();
    }

    let orchestrator = Orchestrator::builder(paths.state()).build().unwrap();
    let views = orchestrator.load_journal_entries().await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].entry, entry);
    assert!(orchestrator.get_todays_mood_entry().await.unwrap().is_some());
}

#[tokio::test]
async fn test_password_key_survives_reopen() {
    let paths = Paths::new();
    let password = "a long enough password";
    let entry = JournalEntry::new("sealed with a password");

    {
        let state = paths.state();
        let orchestrator = Orchestrator::builder(state)
            .key_source(KeySource::password(password))
            .build()
            .unwrap();
        orchestrator.keys().enable_password(password).unwrap();
        orchestrator.save_journal_entry(&entry).await.unwrap();
    }

    let orchestrator = Orchestrator::builder(paths.state())
        .key_source(KeySource::password(password))
        .build()
        .unwrap();
    assert!(orchestrator.keys().is_password_protected().unwrap());
    let views = orchestrator.load_journal_entries().await.unwrap();
    assert_eq!(views[0].entry, entry);
}

#[tokio::test]
async fn test_migration_into_directory_remote() {
    let paths = Paths::new();
    let entry = JournalEntry::new("moving house");

    {
        let orchestrator = Orchestrator::builder(paths.state()).build().unwrap();
        orchestrator.save_journal_entry(&entry).await.unwrap();
        orchestrator
            .save_mood_entry(MoodLevel::Great, None)
            .await
            .unwrap();
    }

    let remote = paths.remote();
    let mut orchestrator = Orchestrator::builder(paths.state())
        .remote(remote.clone())
        .build()
        .unwrap();
    let report = orchestrator.migrate_local_to_remote().await.unwrap();
    assert!(report.completed);
    assert_eq!(orchestrator.mode(), BackendMode::RemoteActive);

    let document = remote
        .namespace()
        .join("journalEntries")
        .join(format!("{}.json", entry.id));
    let raw = fs::read_to_string(&document).expect("journal document should exist");
    assert!(!raw.contains("moving house"));
    assert!(raw.contains("\"encrypted\""));

    let reopened = Orchestrator::builder(paths.state())
        .remote(remote)
        .build()
        .unwrap();
    assert_eq!(reopened.mode(), BackendMode::RemoteActive);
    let views = reopened.load_journal_entries().await.unwrap();
    assert_eq!(views[0].entry, entry);
    assert_eq!(reopened.get_mood_history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_damaged_remote_journal_document_loads_as_placeholder() {
    let paths = Paths::new();
    let remote = paths.remote();
    let mut orchestrator = Orchestrator::builder(paths.state())
        .remote(remote.clone())
        .build()
        .unwrap();
    orchestrator.skip_migration().unwrap();
    orchestrator
        .save_journal_entry(&JournalEntry::new("a"))
        .await
        .unwrap();
    orchestrator
        .save_journal_entry(&JournalEntry::new("b"))
        .await
        .unwrap();
    fs::write(
        remote.namespace().join("journalEntries").join("c.json"),
        br#"{"id":"c","encr"#,
    )
    .unwrap();

    let views = orchestrator.load_journal_entries().await.unwrap();
    assert_eq!(views.len(), 3);
    let damaged: Vec<_> = views.iter().filter(|view| view.is_error()).collect();
    assert_eq!(damaged.len(), 1);
    assert_eq!(damaged[0].entry.id.as_str(), "c");
    assert_eq!(damaged[0].error, Some(ErrorKind::DecryptionFailed));
    assert_eq!(damaged[0].entry.content, UNDECRYPTABLE_CONTENT);
}
