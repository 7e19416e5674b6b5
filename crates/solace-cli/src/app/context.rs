//! Application context for the Solace CLI.
//!
//! Bundles the CLI arguments with the lazily-loaded config and knows how to
//! open the stores and build an orchestrator from them.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use solace_core::storage::{DirRemoteStore, SqliteLocalStore};
use solace_core::{DeviceState, KeyManager, KeySource, Orchestrator, SystemCrypto};

use crate::cli::Cli;
use crate::config::{read_config, SecurityMode, SolaceConfig};
use crate::errors::CliError;
use crate::ui::UiContext;

use super::password::prompt_password;
use super::resolver::{missing_config_message, resolve_config_path, MISSING_CONFIG_HINT};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<SolaceConfig>,
    ui: UiContext,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            ui: UiContext::from_env(cli.json, cli.no_color),
        }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    /// Prompts are allowed only on a terminal and without `--no-input`.
    pub fn interactive(&self) -> bool {
        !self.cli.no_input && std::io::stdin().is_terminal()
    }

    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        resolve_config_path(self.cli)
    }

    /// The config, read once on first use.
    pub fn config(&self) -> anyhow::Result<&SolaceConfig> {
        self.config.get_or_try_init(|| {
            let path = self.config_path()?;
            if !path.exists() {
                return Err(
                    CliError::not_found(missing_config_message(&path), MISSING_CONFIG_HINT).into(),
                );
            }
            read_config(&path)
        })
    }

    /// Open the local store named by the config.
    pub fn open_state(&self) -> anyhow::Result<Arc<DeviceState>> {
        let path = self.config()?.store_path()?;
        debug!(path = %path.display(), "opening local store");
        let store = SqliteLocalStore::open(&path)?;
        Ok(Arc::new(DeviceState::new(Arc::new(store))))
    }

    /// Open the remote store, if one is enabled.
    pub fn open_remote(&self, state: &DeviceState) -> anyhow::Result<Option<Arc<DirRemoteStore>>> {
        let config = self.config()?;
        let Some(root) = config.remote_path()? else {
            return Ok(None);
        };
        let user_id = match &config.remote.user_id {
            Some(id) => id.clone(),
            None => state.device_id()?,
        };
        Ok(Some(Arc::new(DirRemoteStore::new(root, &user_id)?)))
    }

    /// Key manager for the device state, for checks that need no key.
    pub fn key_manager(&self, state: &Arc<DeviceState>) -> KeyManager {
        KeyManager::new(Arc::clone(state), Arc::new(SystemCrypto))
    }

    /// True when the journal key has to come from a password.
    pub fn uses_password(&self, state: &Arc<DeviceState>) -> anyhow::Result<bool> {
        Ok(self.config()?.security.mode == SecurityMode::Password
            || self.key_manager(state).is_password_protected()?)
    }

    /// Build an orchestrator over the configured stores, asking for the
    /// password when the journal needs one.
    pub fn open_orchestrator(&self) -> anyhow::Result<Orchestrator> {
        let state = self.open_state()?;
        let key_source = if self.uses_password(&state)? {
            let password = prompt_password(self.interactive())?;
            KeySource::password(&password)
        } else {
            KeySource::Device
        };
        self.build_orchestrator(state, key_source)
    }

    pub fn build_orchestrator(
        &self,
        state: Arc<DeviceState>,
        key_source: KeySource,
    ) -> anyhow::Result<Orchestrator> {
        let mut builder = Orchestrator::builder(state.clone()).key_source(key_source);
        if let Some(remote) = self.open_remote(&state)? {
            builder = builder.remote(remote);
        }
        let orchestrator = builder.build()?;
        debug!(mode = %orchestrator.mode(), "orchestrator ready");
        Ok(orchestrator)
    }
}
