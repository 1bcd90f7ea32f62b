//! /config list, get and set

use std::str::FromStr;
use std::sync::Arc;
use zorac_core::commands::ConfigCommand;
use zorac_core::{ConfigKey, OpenAiCompatClient, TokenAccountant, ZoracResult};

use crate::app::App;

pub async fn handle(app: &mut App, command: ConfigCommand) {
    match command {
        ConfigCommand::List => list(app),
        ConfigCommand::Get(key) => get(app, &key),
        ConfigCommand::Set { key, value } => set(app, &key, &value).await,
        ConfigCommand::Usage => app.console.info(
            "Usage: /config list | /config get KEY | /config set KEY VALUE",
        ),
    }
}

fn list(app: &App) {
    app.console.print_header("Configuration");
    let mut rows: Vec<(String, String)> = app
        .settings
        .list()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    rows.push((
        "Config File".to_string(),
        app.config.path().display().to_string(),
    ));
    app.console.print_table(&rows);
}

fn get(app: &App, key: &str) {
    match ConfigKey::from_str(key) {
        Ok(key) => {
            let value = app
                .settings
                .list()
                .into_iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v)
                .unwrap_or_default();
            app.console.info(&format!("{} = {}", key, value));
        }
        Err(e) => app.console.error(&format!(
            "{}\nAvailable settings: {}",
            e,
            ConfigKey::names()
        )),
    }
}

async fn set(app: &mut App, key: &str, value: &str) {
    let key = match ConfigKey::from_str(key) {
        Ok(key) => key,
        Err(e) => {
            app.console
                .error(&format!("{}\nAvailable keys: {}", e, ConfigKey::names()));
            return;
        }
    };

    let value = match app.config.set(key, value) {
        Ok(value) => value,
        Err(e) => {
            app.console.error(&e.to_string());
            return;
        }
    };
    app.console.success(&format!(
        "Updated {} in {}",
        key,
        app.config.path().display()
    ));

    if let Err(e) = apply(app, key, &value).await {
        app.console
            .warn(&format!("Saved, but not applied to this session: {}", e));
    }
}

/// Make a saved value take effect without restarting
async fn apply(app: &mut App, key: ConfigKey, value: &str) -> ZoracResult<()> {
    app.settings.apply(key, value)?;

    match key {
        ConfigKey::BaseUrl | ConfigKey::ApiKey | ConfigKey::RequestTimeout => {
            let client = OpenAiCompatClient::with_timeout(
                &app.settings.base_url,
                &app.settings.api_key,
                app.settings.request_timeout(),
            )?;
            app.coordinator.replace_client(Arc::new(client));
            app.console.info("Client updated, reconnecting...");
            app.check_connection().await;
        }
        ConfigKey::Model => {
            app.controller.set_summary_model(&app.settings.model);
            app.console
                .info(&format!("Model changed to {}", app.settings.model));
        }
        ConfigKey::MaxInputTokens | ConfigKey::KeepRecentMessages => {
            app.controller.set_settings(app.settings.context_settings());
        }
        ConfigKey::Encoding => {
            let accountant = TokenAccountant::new(&app.settings.encoding)?;
            app.controller.set_accountant(accountant.clone());
            app.coordinator.set_accountant(accountant);
            app.console.info(&format!(
                "Token count is now ~{}",
                app.controller.token_count()
            ));
        }
        ConfigKey::CodeTheme => {
            if !app.console.set_code_theme(&app.settings.code_theme) {
                app.console
                    .warn("Theme not found, code blocks use the default theme.");
            }
        }
        ConfigKey::Stream => app.console.info(&format!(
            "Streaming {}.",
            if app.settings.stream { "enabled" } else { "disabled" }
        )),
        ConfigKey::MaxOutputTokens | ConfigKey::Temperature => {}
    }
    Ok(())
}
