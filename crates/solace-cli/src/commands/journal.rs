use std::io::{IsTerminal, Read};

use solace_core::storage::{JournalEntry, MoodLevel};

use crate::app::AppContext;
use crate::errors::CliError;
use crate::ui::{badge, header, hint, print, print_json, receipt, table, truncate, Badge};

use super::{format_local, format_mood};

pub async fn handle_add(
    ctx: &AppContext<'_>,
    text: Option<&str>,
    mood: Option<&str>,
) -> anyhow::Result<()> {
    let content = match text {
        Some(text) => text.to_string(),
        None => read_stdin()?,
    };
    let content = content.trim();
    if content.is_empty() {
        return Err(CliError::invalid_input("Journal entry is empty").into());
    }

    let mut entry = JournalEntry::new(content);
    if let Some(mood) = mood {
        entry = entry.with_mood(mood.parse::<MoodLevel>()?.tag());
    }

    let orchestrator = ctx.open_orchestrator()?;
    let record = orchestrator.save_journal_entry(&entry).await?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&entry);
    }
    if ctx.quiet() {
        println!("{}", record.id);
        return Ok(());
    }
    print(
        ui,
        &receipt(
            ui,
            "Entry saved",
            &[
                ("ID", record.id.to_string()),
                ("Date", format_local(entry.timestamp)),
                ("Backend", orchestrator.mode().to_string()),
            ],
        ),
    );
    Ok(())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(CliError::invalid_input(
            "No entry text given. Pass TEXT or pipe the entry on stdin.",
        )
        .into());
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(buffer)
}

pub async fn handle_list(ctx: &AppContext<'_>, limit: Option<usize>) -> anyhow::Result<()> {
    let orchestrator = ctx.open_orchestrator()?;
    let mut views = orchestrator.load_journal_entries().await?;
    if let Some(limit) = limit {
        views.truncate(limit);
    }

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&views);
    }

    let count = format!("{} entries", views.len());
    print(ui, &header(ui, "journal list", Some(&count)));
    if views.is_empty() {
        if !ctx.quiet() {
            print(ui, &hint(ui, "Add one with `solace journal add \"...\"`."));
        }
        return Ok(());
    }

    let width = ui.width.saturating_sub(40).max(20);
    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|view| {
            let content = if view.is_error() {
                badge(ui, Badge::Warn, "unreadable")
            } else {
                truncate(&view.entry.content, width)
            };
            vec![
                format_local(view.entry.timestamp),
                view.entry
                    .mood
                    .as_ref()
                    .map(|mood| format_mood(mood, ui.unicode))
                    .unwrap_or_default(),
                content,
            ]
        })
        .collect();
    print(ui, &table(ui, &["Date", "Mood", "Entry"], &rows));

    let unreadable = views.iter().filter(|view| view.is_error()).count();
    if unreadable > 0 && !ctx.quiet() {
        print(
            ui,
            &hint(
                ui,
                &format!(
                    "{} entries could not be decrypted. The key may have been reset or the password is wrong.",
                    unreadable
                ),
            ),
        );
    }
    Ok(())
}
