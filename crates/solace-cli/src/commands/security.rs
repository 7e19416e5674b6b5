use dialoguer::{Confirm, Input};
use serde_json::json;
use solace_core::crypto::RESET_PHRASE;
use solace_core::{KeyManager, KeySource};

use crate::app::{prompt_new_password, AppContext};
use crate::cli::ResetKeyArgs;
use crate::config::{read_config, write_config, SecurityMode};
use crate::errors::CliError;
use crate::ui::{badge, hint, print, print_json, receipt, Badge};

/// Switch the journal key to one derived from a password.
pub fn handle_password_enable(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let state = ctx.open_state()?;
    if ctx.key_manager(&state).is_password_protected()? {
        return Err(CliError::invalid_input("Password protection is already enabled").into());
    }

    let ui = ctx.ui();
    if !ui.mode.is_json() {
        eprintln!(
            "{}",
            badge(
                ui,
                Badge::Warn,
                "Entries saved so far stay encrypted with the device key and will not open with the password."
            )
        );
    }
    if ctx.interactive() {
        let proceed = Confirm::new()
            .with_prompt("Enable password protection?")
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;
        if !proceed {
            return Err(CliError::invalid_input("Password protection not enabled").into());
        }
    }

    let password = prompt_new_password(ctx.interactive())?;
    let orchestrator = ctx.build_orchestrator(state, KeySource::password(&password))?;
    orchestrator.keys().enable_password(&password)?;
    set_security_mode(ctx, SecurityMode::Password)?;

    if ui.mode.is_json() {
        return print_json(&json!({ "key_mode": SecurityMode::Password }));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Password protection enabled",
                &[("Key mode", "password".to_string())],
            ),
        );
    }
    Ok(())
}

/// Delete the journal key after explicit confirmation.
pub fn handle_reset_key(ctx: &AppContext<'_>, args: &ResetKeyArgs) -> anyhow::Result<()> {
    let phrase = match &args.confirm {
        Some(phrase) => phrase.clone(),
        None if ctx.interactive() => confirm_interactively()?,
        None => {
            return Err(CliError::invalid_input(format!(
                "Key reset needs confirmation. Run interactively or pass --confirm {}.",
                RESET_PHRASE
            ))
            .into())
        }
    };
    let confirmation = KeyManager::confirm_reset(&phrase)?;

    let state = ctx.open_state()?;
    let orchestrator = ctx.build_orchestrator(state, KeySource::Device)?;
    orchestrator.reset_encryption(confirmation)?;
    set_security_mode(ctx, SecurityMode::Device)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "reset": true, "key_mode": SecurityMode::Device }));
    }
    if !ctx.quiet() {
        print(
            ui,
            &receipt(
                ui,
                "Journal key deleted",
                &[("Key mode", "device".to_string())],
            ),
        );
        print(
            ui,
            &hint(
                ui,
                "A new device key is created on the next save. Older entries stay unreadable.",
            ),
        );
    }
    Ok(())
}

/// Two yes/no prompts, then the typed phrase.
fn confirm_interactively() -> anyhow::Result<String> {
    let prompts = [
        "Delete the journal key? Every existing entry becomes permanently unreadable.",
        "This cannot be undone. Continue?",
    ];
    for prompt in prompts {
        let proceed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;
        if !proceed {
            return Err(CliError::invalid_input("Key reset cancelled").into());
        }
    }
    Input::<String>::new()
        .with_prompt(format!("Type {} to confirm", RESET_PHRASE))
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))
}

fn set_security_mode(ctx: &AppContext<'_>, mode: SecurityMode) -> anyhow::Result<()> {
    let path = ctx.config_path()?;
    let mut config = read_config(&path)?;
    if config.security.mode != mode {
        config.security.mode = mode;
        write_config(&path, &config)?;
    }
    Ok(())
}
