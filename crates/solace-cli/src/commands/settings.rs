use dialoguer::Password;
use serde_json::{json, Value};

use crate::app::AppContext;
use crate::errors::CliError;
use crate::ui::{header, kv, print, print_json, receipt};

use super::format_local;

pub async fn handle_show(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let orchestrator = ctx.open_orchestrator()?;
    let settings = orchestrator.get_settings().await?.unwrap_or_default();

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({
            "apiKey": settings.api_key.as_deref().map(mask_secret),
            "preferences": settings.preferences,
            "updatedAt": settings.updated_at,
        }));
    }

    print(ui, &header(ui, "settings", None));
    let api_key = settings
        .api_key
        .as_deref()
        .map(mask_secret)
        .unwrap_or_else(|| "not set".to_string());
    print(ui, &kv(ui, "API key", &api_key));
    for (key, value) in &settings.preferences {
        print(ui, &kv(ui, key, &display_value(value)));
    }
    if let Some(updated) = settings.updated_at {
        print(ui, &kv(ui, "Updated", &format_local(updated)));
    }
    Ok(())
}

pub async fn handle_set_api_key(ctx: &AppContext<'_>, key: Option<&str>) -> anyhow::Result<()> {
    let key = match key {
        Some(key) => key.trim().to_string(),
        None if ctx.interactive() => Password::new()
            .with_prompt("API key")
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read API key: {}", e))?,
        None => {
            return Err(CliError::invalid_input("No API key given. Pass KEY as an argument.").into())
        }
    };
    if key.is_empty() {
        return Err(CliError::invalid_input("API key is empty").into());
    }

    let orchestrator = ctx.open_orchestrator()?;
    let mut settings = orchestrator.get_settings().await?.unwrap_or_default();
    settings.api_key = Some(key);
    let saved = orchestrator.save_settings(&settings).await?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&json!({ "apiKey": saved.api_key.as_deref().map(mask_secret) }));
    }
    if !ctx.quiet() {
        let masked = saved.api_key.as_deref().map(mask_secret).unwrap_or_default();
        print(ui, &receipt(ui, "API key saved", &[("API key", masked)]));
    }
    Ok(())
}

pub async fn handle_set(ctx: &AppContext<'_>, key: &str, value: &str) -> anyhow::Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::invalid_input("Preference name is empty").into());
    }

    let orchestrator = ctx.open_orchestrator()?;
    let mut settings = orchestrator.get_settings().await?.unwrap_or_default();
    settings
        .preferences
        .insert(key.to_string(), parse_value(value));
    let saved = orchestrator.save_settings(&settings).await?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&saved.preferences);
    }
    if !ctx.quiet() {
        let shown = saved
            .preferences
            .get(key)
            .map(display_value)
            .unwrap_or_default();
        print(ui, &receipt(ui, "Preference saved", &[(key, shown)]));
    }
    Ok(())
}

/// JSON when it parses, otherwise the raw string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Show only the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("dark"), Value::String("dark".to_string()));
        assert_eq!(parse_value("{\"a\":1}"), json!({"a": 1}));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-abcdef1234"), "********1234");
        assert_eq!(mask_secret("abc"), "***");
    }
}
