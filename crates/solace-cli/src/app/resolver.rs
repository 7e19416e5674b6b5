//! Path resolution for the config file.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::default_config_path;

/// Resolve the config path: `--config` (or `SOLACE_CONFIG`), then the XDG default.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(value) = cli.config.as_deref() {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Error message when the config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!("No Solace config found at {}", config_path.display())
}

pub const MISSING_CONFIG_HINT: &str =
    "Hint: Run `solace init`, or point SOLACE_CONFIG at an existing config.";
