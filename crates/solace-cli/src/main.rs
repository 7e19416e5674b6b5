//! Solace CLI - an encrypted journal and mood tracker that works offline
//!
//! This is the command-line interface for Solace. It wires the config, the
//! local and remote stores and the persistence orchestrator together.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod logging;
mod ui;

use clap::Parser;

use crate::app::AppContext;
use crate::cli::{
    Cli, Commands, JournalSubcommand, MoodSubcommand, PasswordSubcommand, SettingsSubcommand,
};
use crate::commands::{init, journal, migrate, misc, mood, security, settings, status};
use crate::errors::exit_code_for;
use crate::ui::print_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);
    logging::init(
        ctx.config()
            .ok()
            .and_then(|config| config.log.level.as_deref()),
    );

    if let Err(e) = run(&ctx, &cli).await {
        let error_msg = format!("{}", e);
        let (message, hint) = split_hint(&error_msg);
        let hint = hint.or_else(|| contextual_hint(message));
        print_error(ctx.ui(), message, hint.as_deref());
        std::process::exit(exit_code_for(&e));
    }
}

/// Split a trailing "Hint: ..." line off an error message.
fn split_hint(error: &str) -> (&str, Option<String>) {
    match error.find("\nHint:") {
        Some(idx) => (
            &error[..idx],
            Some(error[idx + "\nHint:".len()..].trim().to_string()),
        ),
        None => (error, None),
    }
}

/// Hints for common core errors.
fn contextual_hint(error: &str) -> Option<String> {
    let error_lower = error.to_lowercase();

    if error_lower.contains("password protected") {
        return Some("Set SOLACE_PASSWORD or run interactively.".to_string());
    }
    if error_lower.contains("password must be") {
        return Some("Choose a longer password.".to_string());
    }
    if error_lower.contains("persistence failed") && error_lower.contains("remote") {
        return Some(
            "Check that the remote path in the config exists and is mounted.".to_string(),
        );
    }
    if error_lower.contains("mood") {
        return Some(
            "Moods are 1-5 or one of: struggling, low, okay, good, great.".to_string(),
        );
    }
    None
}

async fn run(ctx: &AppContext<'_>, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init(args) => init::handle_init(ctx, args)?,
        Commands::Status => status::handle_status(ctx).await?,
        Commands::Journal(JournalSubcommand::Add { text, mood }) => {
            journal::handle_add(ctx, text.as_deref(), mood.as_deref()).await?
        }
        Commands::Journal(JournalSubcommand::List { limit }) => {
            journal::handle_list(ctx, *limit).await?
        }
        Commands::Mood(MoodSubcommand::Set { mood, chat }) => {
            mood::handle_set(ctx, mood, chat.as_deref()).await?
        }
        Commands::Mood(MoodSubcommand::Today) => mood::handle_today(ctx).await?,
        Commands::Mood(MoodSubcommand::History { limit }) => {
            mood::handle_history(ctx, *limit).await?
        }
        Commands::Settings(SettingsSubcommand::Show) => settings::handle_show(ctx).await?,
        Commands::Settings(SettingsSubcommand::SetApiKey { key }) => {
            settings::handle_set_api_key(ctx, key.as_deref()).await?
        }
        Commands::Settings(SettingsSubcommand::Set { key, value }) => {
            settings::handle_set(ctx, key, value).await?
        }
        Commands::Migrate(args) => migrate::handle_migrate(ctx, args.skip).await?,
        Commands::Password(PasswordSubcommand::Enable) => {
            security::handle_password_enable(ctx)?
        }
        Commands::ResetKey(args) => security::handle_reset_key(ctx, args)?,
        Commands::Completions { shell } => misc::handle_completions(*shell),
    }
    Ok(())
}
