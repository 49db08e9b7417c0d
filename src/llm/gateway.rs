use crate::config::GatewayConfig;
use crate::error::{ForgeError, Result};
use crate::llm::transcript::Transcript;
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// A lazy, single-consumption sequence of assistant text fragments.
pub type FragmentStream<'a> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

/// What a request is for; selects the temperature and output ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPurpose {
    #[default]
    Conversation,
    Generation,
}

/// Per-call options. Unset fields fall back to the gateway's configuration
/// for the call's purpose.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub purpose: CompletionPurpose,
    pub temperature: Option<f64>,
    pub max_tokens: Option<usize>,
}

impl CompletionOptions {
    /// Options for chat turns and questions (configured chat knobs).
    pub fn conversation() -> Self {
        Self::default()
    }

    /// Options for code and scaffold generation (configured generation knobs).
    pub fn generation() -> Self {
        Self {
            purpose: CompletionPurpose::Generation,
            ..Default::default()
        }
    }

    /// Override the temperature for this call only.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the output ceiling for this call only.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Resolve the effective `(temperature, max_tokens)` pair.
    pub fn resolve(&self, config: &GatewayConfig) -> (f64, usize) {
        let (temperature, max_tokens) = match self.purpose {
            CompletionPurpose::Conversation => (config.chat_temperature, config.chat_max_tokens),
            CompletionPurpose::Generation => {
                (config.generation_temperature, config.generation_max_tokens)
            }
        };
        (self.temperature.unwrap_or(temperature), self.max_tokens.unwrap_or(max_tokens))
    }
}

/// Boundary to a remote chat-completion endpoint.
///
/// Implementations hold only immutable configuration, so one instance can be
/// shared across any number of sessions.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send the whole transcript and wait for the complete assistant reply.
    async fn complete(
        &self,
        transcript: &Transcript,
        options: &CompletionOptions,
    ) -> Result<String>;

    /// Send the whole transcript in incremental-delivery mode.
    ///
    /// Fragments are yielded in arrival order, one network read at a time.
    /// The stream ends after the remote end-of-stream sentinel; a failure is
    /// yielded as the final item.
    fn complete_stream<'a>(
        &'a self,
        transcript: &'a Transcript,
        options: &'a CompletionOptions,
    ) -> FragmentStream<'a>;

    /// Model identifier sent with each request
    fn model(&self) -> &str;
}

/// Treat [`ForgeError::EmptyResponse`] as an empty reply.
pub fn recover_empty(result: Result<String>) -> Result<String> {
    match result {
        Err(ForgeError::EmptyResponse) => Ok(String::new()),
        other => other,
    }
}
