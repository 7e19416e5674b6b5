use std::path::PathBuf;

use serde_json::json;
use solace_core::KeySource;

use crate::app::{prompt_new_password, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_store_path, write_config, SecurityMode, SolaceConfig};
use crate::errors::CliError;
use crate::ui::{hint, print, print_json, receipt};

pub fn handle_init(ctx: &AppContext<'_>, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = ctx.config_path()?;
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}. Use --force to overwrite it.",
            config_path.display()
        ))
        .into());
    }

    let store_path = match &args.store {
        Some(path) => PathBuf::from(path),
        None => default_store_path()?,
    };
    let mut config = SolaceConfig::new(
        store_path,
        args.remote.as_ref().map(PathBuf::from),
        args.user_id.clone(),
    );
    if args.password {
        config.security.mode = SecurityMode::Password;
    }
    write_config(&config_path, &config)?;

    let state = ctx.open_state()?;
    let device_id = state.device_id()?;
    if args.password {
        let password = prompt_new_password(ctx.interactive())?;
        let orchestrator = ctx.build_orchestrator(state, KeySource::password(&password))?;
        orchestrator.keys().enable_password(&password)?;
    } else {
        let orchestrator = ctx.build_orchestrator(state, KeySource::Device)?;
        orchestrator.keys().get_or_create_device_key()?;
    }

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({
            "config": config_path,
            "store": config.store.path,
            "remote": config.remote.path,
            "device_id": device_id,
            "key_mode": config.security.mode,
        }));
    }
    if ctx.quiet() {
        return Ok(());
    }

    print(
        ui,
        &receipt(
            ui,
            "Solace initialized",
            &[
                ("Config", config_path.display().to_string()),
                ("Store", config.store.path.clone()),
                ("Device ID", device_id),
                ("Key mode", key_mode_label(config.security.mode).to_string()),
            ],
        ),
    );
    if config.remote.enabled {
        print(
            ui,
            &hint(ui, "Run `solace migrate` to copy local data to the remote store."),
        );
    }
    Ok(())
}

pub(crate) fn key_mode_label(mode: SecurityMode) -> &'static str {
    match mode {
        SecurityMode::Device => "device",
        SecurityMode::Password => "password",
    }
}
