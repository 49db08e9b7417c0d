//! Endpoint, credential and sampling configuration.
//!
//! [`GatewayConfig`] is read once and then handed to a gateway, which owns it
//! for the rest of its life. Values come from, in order of precedence, the
//! process environment (after `.env`), the settings file (see [`file`]), and
//! built-in defaults.

pub mod file;

pub use file::ConfigFile;

use crate::error::{ForgeError, Result};
use file::{KEY_API_KEY, KEY_ENDPOINT, KEY_MAX_TOKENS, KEY_MODEL, KEY_TEMPERATURE};
use std::time::Duration;

pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const ENDPOINT_VAR: &str = "DEEPSEEK_API_ENDPOINT";
pub const MODEL_VAR: &str = "FORGE_MODEL";
pub const TIMEOUT_VAR: &str = "FORGE_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Configuration for connecting to a chat-completion endpoint.
#[derive(Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub chat_temperature: f64,
    pub generation_temperature: f64,
    pub chat_max_tokens: usize,
    pub generation_max_tokens: usize,
    pub timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Configuration with default endpoint, model and sampling knobs.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            chat_temperature: 0.7,
            generation_temperature: 0.5,
            chat_max_tokens: 4096,
            generation_max_tokens: 8192,
            timeout: None,
        }
    }

    /// Read configuration from the environment and the settings file.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Fails when no API key is set in either place.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let file = ConfigFile::load_default()?;
        Self::from_sources(|key| std::env::var(key).ok(), &file)
    }

    fn from_sources(lookup: impl Fn(&str) -> Option<String>, file: &ConfigFile) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = match env(API_KEY_VAR) {
            Some(key) => key,
            None => file.string(KEY_API_KEY)?.ok_or_else(|| {
                ForgeError::ConfigError(format!(
                    "{API_KEY_VAR} environment variable not set and no {KEY_API_KEY} in {}",
                    file.path().display()
                ))
            })?,
        };

        let mut config = Self::new(api_key);
        if let Some(base_url) = env(ENDPOINT_VAR).or(file.string(KEY_ENDPOINT)?) {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = env(MODEL_VAR).or(file.string(KEY_MODEL)?) {
            config.model = model;
        }
        if let Some(temperature) = file.float(KEY_TEMPERATURE)? {
            config.chat_temperature = temperature;
        }
        if let Some(max_tokens) = file.unsigned(KEY_MAX_TOKENS)? {
            config.chat_max_tokens = max_tokens;
        }
        if let Some(secs) = env(TIMEOUT_VAR) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ForgeError::ConfigError(format!("{TIMEOUT_VAR} must be a whole number of seconds"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Endpoint root; a trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_chat_temperature(mut self, temperature: f64) -> Self {
        self.chat_temperature = temperature;
        self
    }

    pub fn with_generation_temperature(mut self, temperature: f64) -> Self {
        self.generation_temperature = temperature;
        self
    }

    pub fn with_chat_max_tokens(mut self, max_tokens: usize) -> Self {
        self.chat_max_tokens = max_tokens;
        self
    }

    pub fn with_generation_max_tokens(mut self, max_tokens: usize) -> Self {
        self.generation_max_tokens = max_tokens;
        self
    }

    /// Connect and read timeout; see [`DeepSeekGateway::new`](crate::llm::gateways::DeepSeekGateway::new).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The API key with all but its last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count <= 4 {
            return "****".to_string();
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("****{tail}")
    }
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("chat_temperature", &self.chat_temperature)
            .field("generation_temperature", &self.generation_temperature)
            .field("chat_max_tokens", &self.chat_max_tokens)
            .field("generation_max_tokens", &self.generation_max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}
