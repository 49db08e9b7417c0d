//! Persistent settings in `~/.forge/config.toml`.
//!
//! Keys are addressed with dots (`deepseek.model`). The file is merged over
//! built-in defaults, so a partial file is fine, and sections this crate does
//! not read are kept untouched when the file is written back.

use crate::error::{ForgeError, Result};
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

/// Overrides the settings file location.
pub const CONFIG_PATH_VAR: &str = "FORGE_CONFIG";

pub const KEY_API_KEY: &str = "deepseek.api_key";
pub const KEY_ENDPOINT: &str = "deepseek.endpoint";
pub const KEY_MODEL: &str = "deepseek.model";
pub const KEY_TEMPERATURE: &str = "deepseek.temperature";
pub const KEY_MAX_TOKENS: &str = "deepseek.max_tokens";

const SENSITIVE_KEYS: [&str; 4] = ["api_key", "token", "password", "secret"];
pub const MASK: &str = "***SET***";

#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    table: Table,
}

impl ConfigFile {
    /// `$FORGE_CONFIG` if set, otherwise `~/.forge/config.toml`.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_PATH_VAR) {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".forge")
            .join("config.toml")
    }

    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load `path` over the defaults. A missing file is not an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut table = defaults();

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let loaded: Table = content.parse().map_err(|e| {
                    ForgeError::ConfigError(format!("{}: {}", path.display(), e))
                })?;
                deep_merge(&mut table, loaded);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a dotted key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut value = self.table.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        Some(value)
    }

    /// Set a dotted key and write the file.
    ///
    /// `raw` is stored as a boolean, integer or float when it parses as one,
    /// and as a string otherwise; secrets are always strings. Missing sections
    /// are created.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ForgeError::ConfigError(format!("invalid key '{key}'")));
        }
        let (leaf, sections) = parts.split_last().ok_or_else(|| {
            ForgeError::ConfigError(format!("invalid key '{key}'"))
        })?;

        let mut target = &mut self.table;
        for section in sections {
            target = target
                .entry(section.to_string())
                .or_insert(Value::Table(Table::new()))
                .as_table_mut()
                .ok_or_else(|| ForgeError::ConfigError(format!("'{section}' is not a section")))?;
        }
        let value = if is_secret_key(key) {
            Value::String(raw.to_string())
        } else {
            parse_value(raw)
        };
        target.insert(leaf.to_string(), value);

        self.save()
    }

    /// Restore the defaults and write the file.
    pub fn reset(&mut self) -> Result<()> {
        self.table = defaults();
        self.save()
    }

    /// All settings with secrets replaced by a marker.
    pub fn masked(&self) -> Table {
        let mut table = self.table.clone();
        mask_secrets(&mut table);
        table
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.table)
            .map_err(|e| ForgeError::ConfigError(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }

    /// Non-empty string at `key`.
    pub(crate) fn string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    pub(crate) fn float(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Float(f)) => Ok(Some(*f)),
            Some(Value::Integer(i)) => Ok(Some(*i as f64)),
            Some(other) => Err(type_error(key, "a number", other)),
        }
    }

    pub(crate) fn unsigned(&self, key: &str) -> Result<Option<usize>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Integer(i)) if *i > 0 => Ok(Some(*i as usize)),
            Some(other) => Err(type_error(key, "a positive integer", other)),
        }
    }
}

fn defaults() -> Table {
    let mut deepseek = Table::new();
    deepseek.insert("api_key".to_string(), Value::String(String::new()));
    deepseek.insert("model".to_string(), Value::String(super::DEFAULT_MODEL.to_string()));
    deepseek.insert("temperature".to_string(), Value::Float(0.7));
    deepseek.insert("max_tokens".to_string(), Value::Integer(4096));

    let mut table = Table::new();
    table.insert("deepseek".to_string(), Value::Table(deepseek));
    table
}

fn deep_merge(base: &mut Table, update: Table) {
    for (key, value) in update {
        let replacement = match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                deep_merge(existing, incoming);
                None
            }
            (_, value) => Some(value),
        };
        if let Some(value) = replacement {
            base.insert(key, value);
        }
    }
}

/// Whether the last segment of a dotted key names a secret.
pub fn is_secret_key(key: &str) -> bool {
    let leaf = key.rsplit('.').next().unwrap_or(key);
    SENSITIVE_KEYS.contains(&leaf)
}

fn mask_secrets(table: &mut Table) {
    for (key, value) in table.iter_mut() {
        match value {
            Value::Table(inner) => mask_secrets(inner),
            Value::String(s) if is_secret_key(key) => {
                if !s.is_empty() {
                    *s = MASK.to_string();
                }
            }
            _ => {}
        }
    }
}

fn parse_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        Value::Boolean(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::String(raw.to_string())
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> ForgeError {
    ForgeError::ConfigError(format!("{key} must be {expected}, found {found}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let file = ConfigFile::load(dir.path().join("config.toml")).unwrap();

        assert_eq!(file.string(KEY_MODEL).unwrap().as_deref(), Some("deepseek-chat"));
        assert_eq!(file.float(KEY_TEMPERATURE).unwrap(), Some(0.7));
        assert_eq!(file.unsigned(KEY_MAX_TOKENS).unwrap(), Some(4096));
        assert_eq!(file.string(KEY_API_KEY).unwrap(), None);
    }

    #[test]
    fn test_partial_file_is_merged_over_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deepseek]\nmodel = \"deepseek-coder\"\n\n[github]\ntoken = \"t\"\n")
            .unwrap();

        let file = ConfigFile::load(&path).unwrap();

        assert_eq!(file.string(KEY_MODEL).unwrap().as_deref(), Some("deepseek-coder"));
        assert_eq!(file.unsigned(KEY_MAX_TOKENS).unwrap(), Some(4096));
        assert_eq!(file.get("github.token").and_then(Value::as_str), Some("t"));
    }

    #[test]
    fn test_set_writes_typed_values_and_keeps_other_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[general]\nverbose = true\n").unwrap();

        let mut file = ConfigFile::load(&path).unwrap();
        file.set("deepseek.temperature", "0.2").unwrap();
        file.set("deepseek.max_tokens", "2048").unwrap();
        file.set("deepseek.api_key", "12345").unwrap();

        let reloaded = ConfigFile::load(&path).unwrap();
        assert_eq!(reloaded.float(KEY_TEMPERATURE).unwrap(), Some(0.2));
        assert_eq!(reloaded.unsigned(KEY_MAX_TOKENS).unwrap(), Some(2048));
        assert_eq!(reloaded.string(KEY_API_KEY).unwrap().as_deref(), Some("12345"));
        assert_eq!(reloaded.get("general.verbose"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_set_creates_missing_directory_and_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".forge").join("config.toml");

        let mut file = ConfigFile::load(&path).unwrap();
        file.set("github.default_branch", "main").unwrap();

        assert!(path.exists());
        let reloaded = ConfigFile::load(&path).unwrap();
        assert_eq!(reloaded.get("github.default_branch").and_then(Value::as_str), Some("main"));
    }

    #[test]
    fn test_set_rejects_bad_keys() {
        let dir = tempdir().unwrap();
        let mut file = ConfigFile::load(dir.path().join("config.toml")).unwrap();

        assert!(matches!(file.set("deepseek.", "x"), Err(ForgeError::ConfigError(_))));
        assert!(matches!(
            file.set("deepseek.model.name", "x"),
            Err(ForgeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = ConfigFile::load(&path).unwrap();
        file.set("deepseek.model", "other").unwrap();

        file.reset().unwrap();

        let reloaded = ConfigFile::load(&path).unwrap();
        assert_eq!(reloaded.string(KEY_MODEL).unwrap().as_deref(), Some("deepseek-chat"));
    }

    #[test]
    fn test_masked_hides_secrets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deepseek]\napi_key = \"sk-secret\"\n\n[github]\ntoken = \"\"\n")
            .unwrap();

        let masked = ConfigFile::load(&path).unwrap().masked();

        assert_eq!(masked["deepseek"]["api_key"].as_str(), Some("***SET***"));
        assert_eq!(masked["deepseek"]["model"].as_str(), Some("deepseek-chat"));
        assert_eq!(masked["github"]["token"].as_str(), Some(""));
    }

    #[test]
    fn test_unparsable_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deepseek\nmodel = ").unwrap();

        assert!(matches!(ConfigFile::load(&path), Err(ForgeError::ConfigError(_))));
    }

    #[test]
    fn test_wrong_types_are_config_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deepseek]\ntemperature = \"hot\"\nmax_tokens = -1\n").unwrap();

        let file = ConfigFile::load(&path).unwrap();

        assert!(matches!(file.float(KEY_TEMPERATURE), Err(ForgeError::ConfigError(_))));
        assert!(matches!(file.unsigned(KEY_MAX_TOKENS), Err(ForgeError::ConfigError(_))));
    }

    #[test]
    fn test_is_secret_key() {
        assert!(is_secret_key("deepseek.api_key"));
        assert!(is_secret_key("token"));
        assert!(!is_secret_key("deepseek.model"));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), Value::Boolean(true));
        assert_eq!(parse_value("42"), Value::Integer(42));
        assert_eq!(parse_value("0.5"), Value::Float(0.5));
        assert_eq!(parse_value("deepseek-chat"), Value::String("deepseek-chat".to_string()));
    }
}
