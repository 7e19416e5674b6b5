use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolaceConfig {
    pub store: StoreSection,
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub security: SecuritySection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default)]
    pub enabled: bool,
    pub path: Option<String>,
    /// Namespace inside the remote store; the device id when unset.
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecuritySection {
    #[serde(default)]
    pub mode: SecurityMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    #[default]
    Device,
    Password,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSection {
    pub level: Option<String>,
}

impl SolaceConfig {
    pub fn new(store_path: PathBuf, remote_path: Option<PathBuf>, user_id: Option<String>) -> Self {
        Self {
            store: StoreSection {
                path: store_path.to_string_lossy().to_string(),
            },
            remote: RemoteSection {
                enabled: remote_path.is_some(),
                path: remote_path.map(|path| path.to_string_lossy().to_string()),
                user_id,
            },
            security: SecuritySection::default(),
            log: LogSection::default(),
        }
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        expand_home(&self.store.path)
    }

    /// Directory of the remote store, if one is enabled.
    pub fn remote_path(&self) -> anyhow::Result<Option<PathBuf>> {
        match (&self.remote.enabled, &self.remote.path) {
            (true, Some(path)) => Ok(Some(expand_home(path)?)),
            (true, None) => Err(anyhow::anyhow!(
                "[remote] is enabled but has no path; set remote.path in the config"
            )),
            (false, _) => Ok(None),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("solace.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<SolaceConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &SolaceConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("solace"));
        }
    }
    Ok(home_dir()?.join(".config").join("solace"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("solace"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("solace"))
}

/// Expand a leading `~/` against `$HOME`.
fn expand_home(path: &str) -> anyhow::Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
