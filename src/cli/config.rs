use anyhow::Result;
use clap::Subcommand;
use std::io::{self, Write};
use toml::Value;

use crate::config::file::{is_secret_key, MASK};
use crate::config::{ConfigFile, GatewayConfig, API_KEY_VAR};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// List all configuration values
    List,
    /// Show one value (e.g. deepseek.model)
    Get { key: String },
    /// Set a value (e.g. deepseek.api_key YOUR_KEY)
    Set { key: String, value: String },
    /// Restore the default settings file
    Reset,
}

pub fn run(action: Option<ConfigAction>) -> Result<()> {
    let mut file = ConfigFile::load_default()?;

    match action.unwrap_or(ConfigAction::List) {
        ConfigAction::List => {
            let effective = GatewayConfig::from_env();
            let env_key = std::env::var(API_KEY_VAR).map(|k| !k.trim().is_empty()).unwrap_or(false);
            write_listing(&mut io::stdout(), &file, &effective, env_key)?;
        }
        ConfigAction::Get { key } => match file.get(&key) {
            Some(value) => println!("{key} = {}", shown(&key, value)),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            file.set(&key, &value)?;
            let stored = file.get(&key).cloned().unwrap_or(Value::String(value));
            println!("✓ Set {key} = {}", shown(&key, &stored));
            println!("  in {}", file.path().display());
        }
        ConfigAction::Reset => {
            file.reset()?;
            println!("✓ Configuration reset to defaults ({})", file.path().display());
        }
    }

    Ok(())
}

fn shown(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) if is_secret_key(key) && !s.is_empty() => MASK.to_string(),
        other => other.to_string(),
    }
}

/// Print the settings file (secrets masked) and the configuration a command
/// would actually use.
fn write_listing(
    out: &mut impl Write,
    file: &ConfigFile,
    effective: &crate::Result<GatewayConfig>,
    env_key_present: bool,
) -> io::Result<()> {
    writeln!(out, "Current Configuration:\n")?;
    writeln!(out, "Settings file: {}", file.path().display())?;
    for (section, value) in file.masked() {
        match value {
            Value::Table(entries) => {
                writeln!(out, "  [{section}]")?;
                for (key, value) in entries {
                    writeln!(out, "    {key} = {value}")?;
                }
            }
            other => writeln!(out, "  {section} = {other}")?,
        }
    }

    writeln!(out, "\nEnvironment:")?;
    let status = if env_key_present { "present" } else { "missing" };
    writeln!(out, "  {API_KEY_VAR}: {status}")?;

    writeln!(out, "\nEffective:")?;
    match effective {
        Ok(config) => {
            let source = if env_key_present { "environment" } else { "settings file" };
            writeln!(out, "  api key = {} (from {source})", config.masked_api_key())?;
            writeln!(out, "  endpoint = {}", config.base_url)?;
            writeln!(out, "  model = {}", config.model)?;
            writeln!(
                out,
                "  chat: temperature {}, max tokens {}",
                config.chat_temperature, config.chat_max_tokens
            )?;
            writeln!(
                out,
                "  generate: temperature {}, max tokens {}",
                config.generation_temperature, config.generation_max_tokens
            )?;
            if let Some(timeout) = config.timeout {
                writeln!(out, "  timeout = {}s", timeout.as_secs())?;
            }
        }
        Err(e) => {
            writeln!(out, "  {e}")?;
            writeln!(
                out,
                "  Set a key with: export {API_KEY_VAR}='your-key' or forge config set deepseek.api_key YOUR_KEY"
            )?;
        }
    }
    Ok(())
}
