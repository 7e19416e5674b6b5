use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use solace_core::storage::{keys, SqliteLocalStore};
use solace_core::LocalStore;
use tempfile::TempDir;

const PASSWORD: &str = "correct horse battery";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_solace"))
}

/// An isolated home: config, data and an optional remote root under one temp dir.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("c")).expect("create config dir");
        std::fs::create_dir_all(dir.path().join("d")).expect("create data dir");
        Self { dir }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("c").join("solace").join("config.toml")
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("d").join("solace.db")
    }

    fn remote_path(&self) -> PathBuf {
        self.dir.path().join("remote")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("c"))
            .env("XDG_DATA_HOME", self.dir.path().join("d"))
            .env("SOLACE_CONFIG", self.config_path())
            .env("NO_COLOR", "1")
            .env_remove("SOLACE_PASSWORD")
            .env_remove("SOLACE_LOG")
            .stdin(Stdio::null());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run solace")
    }

    fn run_with_password(&self, password: &str, args: &[&str]) -> Output {
        self.command()
            .env("SOLACE_PASSWORD", password)
            .args(args)
            .output()
            .expect("run solace")
    }

    fn init(&self, extra: &[&str]) {
        let store = self.store_path();
        let mut args = vec!["init", "--store", path_str(&store)];
        args.extend_from_slice(extra);
        let output = if extra.contains(&"--password") {
            self.run_with_password(PASSWORD, &args)
        } else {
            self.run(&args)
        };
        assert_success(&output);
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn json(output: &Output) -> Value {
    assert_success(output);
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_missing_config_exits_not_found() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["journal", "list"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No Solace config found"));
    assert!(stderr.contains("solace init"));
}

#[test]
fn test_init_twice_requires_force() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);
    assert!(sandbox.config_path().exists());
    assert!(sandbox.store_path().exists());

    let store = sandbox.store_path();
    let again = sandbox.run(&["init", "--store", path_str(&store)]);
    assert_eq!(again.status.code(), Some(4));

    let forced = sandbox.run(&["init", "--store", path_str(&store), "--force"]);
    assert_success(&forced);
}

#[test]
fn test_journal_add_and_list() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);

    assert_success(&sandbox.run(&["journal", "add", "first entry"]));
    assert_success(&sandbox.run(&["journal", "add", "second entry", "--mood", "good"]));

    let entries = json(&sandbox.run(&["--json", "journal", "list"]));
    let entries = entries.as_array().expect("array of entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["content"], "second entry");
    assert_eq!(entries[0]["mood"]["label"], "Good");
    assert_eq!(entries[1]["content"], "first entry");
    assert!(entries[0].get("error").is_none());

    let plain = sandbox.run(&["journal", "list"]);
    assert_success(&plain);
    assert!(String::from_utf8_lossy(&plain.stdout).contains("second entry"));
}

#[test]
fn test_journal_add_reads_stdin() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);

    let mut child = sandbox
        .command()
        .args(["journal", "add"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn solace");
    {
        use std::io::Write;
        let mut stdin = child.stdin.take().expect("stdin");
        stdin.write_all(b"piped thoughts\n").expect("write stdin");
    }
    assert_success(&child.wait_with_output().expect("wait"));

    let entries = json(&sandbox.run(&["--json", "journal", "list"]));
    assert_eq!(entries[0]["content"], "piped thoughts");
}

#[test]
fn test_invalid_mood_exits_invalid_input() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);

    let output = sandbox.run(&["mood", "set", "ecstatic"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown mood"));
}

#[test]
fn test_mood_set_twice_keeps_one_entry_per_day() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);

    assert_success(&sandbox.run(&["mood", "set", "2"]));
    let second = json(&sandbox.run(&["--json", "mood", "set", "great"]));
    assert_eq!(second["mood"]["value"], 5);
    assert!(second.get("updatedAt").is_some());

    let history = json(&sandbox.run(&["--json", "mood", "history"]));
    let history = history.as_array().expect("array of moods");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["mood"]["label"], "Great");

    let today = json(&sandbox.run(&["--json", "mood", "today"]));
    assert_eq!(today["mood"]["value"], 5);
}

#[test]
fn test_mood_today_is_null_when_unset() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);
    let today = json(&sandbox.run(&["--json", "mood", "today"]));
    assert!(today.is_null());
}

#[test]
fn test_settings_api_key_is_masked() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);

    assert_success(&sandbox.run(&["settings", "set-api-key", "sk-test-abcd1234"]));
    assert_success(&sandbox.run(&["settings", "set", "theme", "dark"]));
    assert_success(&sandbox.run(&["settings", "set", "reminders", "true"]));

    let settings = json(&sandbox.run(&["--json", "settings", "show"]));
    assert_eq!(settings["apiKey"], "********1234");
    assert_eq!(settings["preferences"]["theme"], "dark");
    assert_eq!(settings["preferences"]["reminders"], true);
    assert!(settings["updatedAt"].is_string());
}

#[test]
fn test_password_mode_requires_the_password() {
    let sandbox = Sandbox::new();
    sandbox.init(&["--password"]);
    assert_success(&sandbox.run_with_password(PASSWORD, &["journal", "add", "private"]));

    let entries = json(&sandbox.run_with_password(PASSWORD, &["--json", "journal", "list"]));
    assert_eq!(entries[0]["content"], "private");

    let missing = sandbox.run(&["--no-input", "journal", "list"]);
    assert_eq!(missing.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&missing.stderr).contains("SOLACE_PASSWORD"));

    let wrong = json(&sandbox.run_with_password("not the password", &["--json", "journal", "list"]));
    assert_eq!(wrong[0]["error"], "decryption_failed");
    assert_ne!(wrong[0]["content"], "private");
}

#[test]
fn test_password_enable_switches_config() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);
    assert_success(&sandbox.run(&["journal", "add", "before password"]));

    let output = sandbox.run_with_password(PASSWORD, &["password", "enable"]);
    assert_success(&output);
    let config = std::fs::read_to_string(sandbox.config_path()).expect("read config");
    assert!(config.contains("mode = \"password\""));

    let status = json(&sandbox.run(&["--json", "status"]));
    assert_eq!(status["key_mode"], "password");

    assert_success(&sandbox.run_with_password(PASSWORD, &["journal", "add", "after password"]));
    let entries = json(&sandbox.run_with_password(PASSWORD, &["--json", "journal", "list"]));
    let entries = entries.as_array().expect("array of entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["content"], "after password");
    // Entries from before the switch were not re-encrypted.
    assert_eq!(entries[1]["error"], "decryption_failed");

    let again = sandbox.run_with_password(PASSWORD, &["password", "enable"]);
    assert_eq!(again.status.code(), Some(4));
}

#[test]
fn test_short_password_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);
    let output = sandbox.run_with_password("short", &["password", "enable"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_reset_key_needs_confirmation() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);
    assert_success(&sandbox.run(&["journal", "add", "soon unreadable"]));

    let unconfirmed = sandbox.run(&["reset-key"]);
    assert_eq!(unconfirmed.status.code(), Some(4));
    let wrong_phrase = sandbox.run(&["reset-key", "--confirm", "reset please"]);
    assert_eq!(wrong_phrase.status.code(), Some(4));

    let entries = json(&sandbox.run(&["--json", "journal", "list"]));
    assert_eq!(entries[0]["content"], "soon unreadable");

    assert_success(&sandbox.run(&["reset-key", "--confirm", "RESET"]));
    let entries = json(&sandbox.run(&["--json", "journal", "list"]));
    assert_eq!(entries[0]["error"], "decryption_failed");

    assert_success(&sandbox.run(&["journal", "add", "fresh start"]));
    let entries = json(&sandbox.run(&["--json", "journal", "list"]));
    assert_eq!(entries[0]["content"], "fresh start");
}

#[test]
fn test_migrate_moves_data_to_remote() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.remote_path()).expect("create remote root");
    let remote = sandbox.remote_path();
    sandbox.init(&["--remote", path_str(&remote), "--user-id", "tester"]);

    assert_success(&sandbox.run(&["journal", "add", "local first"]));
    assert_success(&sandbox.run(&["mood", "set", "okay"]));

    let status = json(&sandbox.run(&["--json", "status"]));
    assert_eq!(status["backend"], "local_only");
    assert_eq!(status["needs_migration"], true);
    assert_eq!(status["remote_reachable"], true);

    let report = json(&sandbox.run(&["--json", "migrate"]));
    assert_eq!(report["completed"], true);
    assert_eq!(report["journal"]["migrated"], 1);
    assert_eq!(report["moods"]["migrated"], 1);

    let namespace = remote.join("users").join("tester");
    assert!(namespace.join("journalEntries").is_dir());

    let status = json(&sandbox.run(&["--json", "status"]));
    assert_eq!(status["backend"], "remote_active");
    assert_eq!(status["needs_migration"], false);

    let entries = json(&sandbox.run(&["--json", "journal", "list"]));
    assert_eq!(entries[0]["content"], "local first");

    let rerun = json(&sandbox.run(&["--json", "migrate"]));
    assert_eq!(rerun["already_migrated"], true);
}

#[test]
fn test_migrate_with_unreachable_remote_fails() {
    let sandbox = Sandbox::new();
    let remote = sandbox.remote_path();
    sandbox.init(&["--remote", path_str(&remote)]);
    assert_success(&sandbox.run(&["journal", "add", "stays local"]));

    let output = sandbox.run(&["migrate"]);
    assert_eq!(output.status.code(), Some(6));

    let status = json(&sandbox.run(&["--json", "status"]));
    assert_eq!(status["backend"], "local_only");
    assert_eq!(status["remote_reachable"], false);
    assert_eq!(status["needs_migration"], true);
}

#[test]
fn test_migrate_skip_switches_backend() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.remote_path()).expect("create remote root");
    let remote = sandbox.remote_path();
    sandbox.init(&["--remote", path_str(&remote)]);
    assert_success(&sandbox.run(&["journal", "add", "left behind"]));

    assert_success(&sandbox.run(&["migrate", "--skip"]));
    let status = json(&sandbox.run(&["--json", "status"]));
    assert_eq!(status["backend"], "remote_active");

    let entries = json(&sandbox.run(&["--json", "journal", "list"]));
    assert!(entries.as_array().expect("array").is_empty());
}

#[test]
fn test_migrate_without_remote_is_invalid() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);
    let output = sandbox.run(&["migrate"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_completions_generate() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["completions", "bash"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("solace"));
}

#[test]
fn test_persisted_salt_alone_means_password_mode() {
    let sandbox = Sandbox::new();
    sandbox.init(&[]);
    {
        let store = SqliteLocalStore::open(&sandbox.store_path()).expect("open store");
        store
            .set(keys::KEY_SALT, "AAAAAAAAAAAAAAAAAAAAAA==")
            .expect("write salt");
    }

    let status = json(&sandbox.run(&["--json", "status"]));
    assert_eq!(status["key_mode"], "password");

    let list = sandbox.run(&["journal", "list"]);
    assert_eq!(list.status.code(), Some(5));

    let enable = sandbox.run_with_password(PASSWORD, &["password", "enable"]);
    assert_eq!(enable.status.code(), Some(4));
}
