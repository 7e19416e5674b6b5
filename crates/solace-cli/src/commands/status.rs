use serde::Serialize;
use solace_core::{BackendMode, KeySource};

use crate::app::AppContext;
use crate::ui::{header, hint, kv, print, print_json};

#[derive(Serialize)]
struct Status {
    config: String,
    store: String,
    remote: Option<String>,
    remote_reachable: Option<bool>,
    backend: BackendMode,
    device_id: String,
    key_mode: &'static str,
    needs_migration: bool,
}

pub async fn handle_status(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let state = ctx.open_state()?;
    let key_mode = if ctx.uses_password(&state)? {
        "password"
    } else {
        "device"
    };

    // Status never touches the key, so no password is needed here.
    let orchestrator = ctx.build_orchestrator(state, KeySource::Device)?;
    let remote = config.remote_path()?;
    let remote_reachable = match remote {
        Some(_) => Some(orchestrator.remote_available().await),
        None => None,
    };

    let status = Status {
        config: ctx.config_path()?.display().to_string(),
        store: config.store_path()?.display().to_string(),
        remote: remote.map(|path| path.display().to_string()),
        remote_reachable,
        backend: orchestrator.mode(),
        device_id: orchestrator.device_id()?,
        key_mode,
        needs_migration: orchestrator.needs_migration()?,
    };

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&status);
    }

    print(ui, &header(ui, "status", None));
    print(ui, &kv(ui, "Config", &status.config));
    print(ui, &kv(ui, "Store", &status.store));
    print(ui, &kv(ui, "Backend", &status.backend.to_string()));
    print(ui, &kv(ui, "Device ID", &status.device_id));
    print(ui, &kv(ui, "Key mode", status.key_mode));
    match (&status.remote, status.remote_reachable) {
        (Some(path), Some(reachable)) => {
            let state = if reachable { "reachable" } else { "unreachable" };
            print(ui, &kv(ui, "Remote", &format!("{} ({})", path, state)));
        }
        _ => print(ui, &kv(ui, "Remote", "none")),
    }
    print(ui, &kv(ui, "Needs migration", &status.needs_migration.to_string()));

    if status.remote.is_some() && status.needs_migration && !ctx.quiet() {
        print(
            ui,
            &hint(
                ui,
                "Run `solace migrate` to move local data, or `solace migrate --skip`.",
            ),
        );
    }
    Ok(())
}
