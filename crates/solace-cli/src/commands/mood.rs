use solace_core::storage::{MoodEntry, MoodLevel, RecordId};

use crate::app::AppContext;
use crate::ui::{header, kv, print, print_json, receipt, table};

use super::{format_local, format_mood};

pub async fn handle_set(
    ctx: &AppContext<'_>,
    mood: &str,
    chat: Option<&str>,
) -> anyhow::Result<()> {
    let level: MoodLevel = mood.parse()?;
    let orchestrator = ctx.open_orchestrator()?;
    let entry = orchestrator
        .save_mood_entry(level, chat.map(RecordId::from))
        .await?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&entry);
    }
    if ctx.quiet() {
        return Ok(());
    }
    let title = if entry.updated_at.is_some() {
        "Today's mood updated"
    } else {
        "Mood recorded"
    };
    print(
        ui,
        &receipt(
            ui,
            title,
            &[
                ("Mood", format_mood(&entry.mood, ui.unicode)),
                ("Date", format_local(entry.timestamp)),
            ],
        ),
    );
    Ok(())
}

pub async fn handle_today(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let orchestrator = ctx.open_orchestrator()?;
    let entry = orchestrator.get_todays_mood_entry().await?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&entry);
    }
    match entry {
        Some(entry) => {
            print(ui, &kv(ui, "Mood", &format_mood(&entry.mood, ui.unicode)));
            print(ui, &kv(ui, "Recorded", &format_local(entry.timestamp)));
        }
        None => print(ui, "No mood recorded today."),
    }
    Ok(())
}

pub async fn handle_history(ctx: &AppContext<'_>, limit: Option<usize>) -> anyhow::Result<()> {
    let orchestrator = ctx.open_orchestrator()?;
    let entries = most_recent(orchestrator.get_mood_history().await?, limit);

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&entries);
    }

    let count = format!("{} days", entries.len());
    print(ui, &header(ui, "mood history", Some(&count)));
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                format_local(entry.timestamp),
                format_mood(&entry.mood, ui.unicode),
                entry.mood.value.to_string(),
            ]
        })
        .collect();
    if !rows.is_empty() {
        print(ui, &table(ui, &["Date", "Mood", "Value"], &rows));
    }
    Ok(())
}

/// Keep the last `limit` entries of an oldest-first history.
fn most_recent(mut entries: Vec<MoodEntry>, limit: Option<usize>) -> Vec<MoodEntry> {
    if let Some(limit) = limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }
    entries
}
