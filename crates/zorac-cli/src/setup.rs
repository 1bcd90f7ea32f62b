//! First-run setup wizard

use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use std::io::IsTerminal;
use zorac_core::{ConfigKey, ConfigStore, ZoracError, ZoracResult};

use crate::console::CliConsole;

/// Ask for the server location and model, then write a complete config file.
///
/// Without a terminal on stdin every key is written with its default.
pub fn run_wizard(config: &ConfigStore, console: &CliConsole) -> ZoracResult<()> {
    if !std::io::stdin().is_terminal() {
        return config.write_defaults(&[]);
    }

    console.print_header("Welcome to Zorac");
    console.info(&format!(
        "No configuration found. Settings will be saved to {}",
        config.path().display()
    ));

    let theme = ColorfulTheme::default();
    let base_url = ask(&theme, "Inference server base URL", ConfigKey::BaseUrl)?;
    let model = ask(&theme, "Model name", ConfigKey::Model)?;

    config.write_defaults(&[(ConfigKey::BaseUrl, base_url), (ConfigKey::Model, model)])?;
    console.success("Configuration saved. Use /config to change settings later.");
    Ok(())
}

fn ask(theme: &ColorfulTheme, prompt: &str, key: ConfigKey) -> ZoracResult<String> {
    Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .default(key.default_value().to_string())
        .validate_with(|value: &String| -> Result<(), String> {
            key.validate(value).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(|e| ZoracError::config_for_key(format!("Setup aborted: {}", e), key.as_str()))
}
