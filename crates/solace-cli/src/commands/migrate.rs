use serde_json::json;
use solace_core::sync::CollectionReport;
use solace_core::{KeySource, MigrationReport};

use crate::app::AppContext;
use crate::errors::CliError;
use crate::ui::{badge, header, hint, print, print_json, receipt, table, Badge, UiContext};

pub async fn handle_migrate(ctx: &AppContext<'_>, skip: bool) -> anyhow::Result<()> {
    if ctx.config()?.remote_path()?.is_none() {
        return Err(CliError::invalid_input(
            "No remote store is configured. Set [remote] enabled and path in the config.",
        )
        .into());
    }

    let ui = ctx.ui();
    if skip {
        let state = ctx.open_state()?;
        let mut orchestrator = ctx.build_orchestrator(state, KeySource::Device)?;
        orchestrator.skip_migration()?;
        if ui.mode.is_json() {
            return print_json(&json!({ "skipped": true, "backend": orchestrator.mode() }));
        }
        if !ctx.quiet() {
            print(
                ui,
                &receipt(
                    ui,
                    "Migration skipped",
                    &[("Backend", orchestrator.mode().to_string())],
                ),
            );
        }
        return Ok(());
    }

    let mut orchestrator = ctx.open_orchestrator()?;
    let report = orchestrator.migrate_local_to_remote().await?;

    if ui.mode.is_json() {
        return print_json(&report);
    }
    render_report(ui, &report, ctx.quiet());
    Ok(())
}

fn render_report(ui: &UiContext, report: &MigrationReport, quiet: bool) {
    if report.already_migrated {
        print(ui, &badge(ui, Badge::Info, "Already migrated; nothing to do."));
        return;
    }

    print(ui, &header(ui, "migrate", None));
    let collections: [(&str, &CollectionReport); 4] = [
        ("journal", &report.journal),
        ("moods", &report.moods),
        ("settings", &report.settings),
        ("chats", &report.chats),
    ];
    let rows: Vec<Vec<String>> = collections
        .iter()
        .map(|(name, collection)| {
            vec![
                name.to_string(),
                collection.migrated.to_string(),
                collection.skipped.to_string(),
                collection.failures.len().to_string(),
            ]
        })
        .collect();
    print(ui, &table(ui, &["Collection", "Migrated", "Skipped", "Failed"], &rows));

    if !quiet {
        for failure in report.failures() {
            let id = failure.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
            print(
                ui,
                &badge(ui, Badge::Warn, &format!("{}: {}", id, failure.message)),
            );
        }
    }

    if report.journal.copied_unreadable > 0 && !quiet {
        print(
            ui,
            &badge(
                ui,
                Badge::Info,
                &format!(
                    "{} journal entries could not be decrypted and were copied unchanged.",
                    report.journal.copied_unreadable
                ),
            ),
        );
    }

    if report.completed {
        print(
            ui,
            &badge(ui, Badge::Ok, "Migration complete; the remote store is now active."),
        );
    } else {
        print(
            ui,
            &badge(ui, Badge::Warn, "Migration incomplete; local storage stays active."),
        );
        print(ui, &hint(ui, "Run `solace migrate` again once the remote is reachable."));
    }
}
