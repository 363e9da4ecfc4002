//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings).context("Failed to serialize config")?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = apply_setting(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
            Output::info(&format!("Opening config in {}...", editor));

            match std::process::Command::new(&editor).arg(&config_path).status() {
                Ok(s) if s.success() => Output::success("Config saved."),
                Ok(_) => Output::warning("Editor exited with non-zero status."),
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `value`.
///
/// The value is parsed as a TOML literal when possible and treated as a
/// string otherwise. The result must still deserialize as valid settings.
fn apply_setting(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings).context("Failed to serialize config")?;

    let parts: Vec<&str> = key.split('.').collect();
    let (last, sections) = match parts.split_last() {
        Some((last, sections)) if !last.is_empty() => (*last, sections),
        _ => bail!("Invalid config key: {}", key),
    };

    let mut table = root
        .as_table_mut()
        .context("Config root is not a table")?;
    for section in sections {
        table = table
            .get_mut(*section)
            .and_then(|v| v.as_table_mut())
            .with_context(|| format!("Unknown config section: {}", section))?;
    }

    let parsed = toml::from_str::<toml::Table>(&format!("v = {}", value))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()));
    table.insert(last.to_string(), parsed);

    let updated: Settings = root
        .try_into()
        .with_context(|| format!("Invalid value for {}: {}", key, value))?;

    // Unknown keys are dropped on deserialize; make sure this one survived.
    let check = toml::Value::try_from(&updated).context("Failed to serialize config")?;
    if parts.iter().try_fold(&check, |v, part| v.get(*part)).is_none() {
        bail!("Unknown config key: {}", key);
    }

    Ok(updated)
}
