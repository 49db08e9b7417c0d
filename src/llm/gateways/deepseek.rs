//! DeepSeek gateway for chat completions.
//!
//! DeepSeek speaks the OpenAI chat-completions protocol, so this gateway works
//! against any compatible endpoint given the right base URL.

use crate::config::GatewayConfig;
use crate::error::{ForgeError, Result};
use crate::llm::gateway::{CompletionGateway, CompletionOptions, FragmentStream};
use crate::llm::gateways::sse::{parse_delta, SseEvent, SseLineBuffer};
use crate::llm::models::WireMessage;
use crate::llm::transcript::Transcript;
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Gateway for DeepSeek (or any OpenAI-compatible) chat completions.
///
/// Holds an HTTP client and immutable configuration only; wrap it in an `Arc`
/// and share it between sessions.
pub struct DeepSeekGateway {
    client: Client,
    config: GatewayConfig,
}

impl DeepSeekGateway {
    /// Create a new gateway with the given configuration.
    ///
    /// A configured timeout bounds connecting and every read. A streamed reply
    /// can run longer than the timeout as long as data keeps arriving; a
    /// whole completion must finish within it.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.connect_timeout(timeout).read_timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    /// Create a gateway from `DEEPSEEK_*` / `FORGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GatewayConfig::from_env()?)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn request_body(
        &self,
        transcript: &Transcript,
        options: &CompletionOptions,
        stream: bool,
    ) -> Value {
        let (temperature, max_tokens) = options.resolve(&self.config);
        let messages: Vec<WireMessage<'_>> =
            transcript.turns().iter().map(WireMessage::from).collect();

        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": stream,
        })
    }

    async fn post(&self, body: &Value, stream: bool) -> Result<Response> {
        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(body);

        if let (Some(timeout), false) = (self.config.timeout, stream) {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ForgeError::RemoteError(format!("{} - {}", status, error_text)));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionGateway for DeepSeekGateway {
    async fn complete(
        &self,
        transcript: &Transcript,
        options: &CompletionOptions,
    ) -> Result<String> {
        info!("Requesting completion");
        debug!("Model: {}, Turn count: {}", self.config.model, transcript.len());

        let body = self.request_body(transcript, options, false);
        let response = self.post(&body, false).await?;
        let response_body: Value = response.json().await?;

        match response_body["choices"][0]["message"]["content"].as_str() {
            Some(content) if !content.is_empty() => Ok(content.to_string()),
            _ => {
                warn!("Completion succeeded without content");
                Err(ForgeError::EmptyResponse)
            }
        }
    }

    fn complete_stream<'a>(
        &'a self,
        transcript: &'a Transcript,
        options: &'a CompletionOptions,
    ) -> FragmentStream<'a> {
        Box::pin(async_stream::stream! {
            info!("Starting streaming completion");
            debug!("Model: {}, Turn count: {}", self.config.model, transcript.len());

            let body = self.request_body(transcript, options, true);
            let response = match self.post(&body, true).await {
                Ok(r) => r,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut bytes = response.bytes_stream();
            let mut lines = SseLineBuffer::new();

            loop {
                let events = match bytes.next().await {
                    Some(Ok(chunk)) => lines.push(&chunk),
                    Some(Err(e)) => {
                        yield Err(ForgeError::StreamInterrupted(e.to_string()));
                        return;
                    }
                    None => match lines.finish() {
                        Some(SseEvent::Done) => return,
                        _ => {
                            yield Err(ForgeError::StreamInterrupted(
                                "connection closed before end of stream".to_string(),
                            ));
                            return;
                        }
                    },
                };

                for event in events {
                    let data = match event {
                        SseEvent::Done => {
                            debug!("End of stream");
                            return;
                        }
                        SseEvent::Data(data) => data,
                    };

                    match parse_delta(&data) {
                        Ok(Some(content)) => yield Ok(content),
                        Ok(None) => {}
                        Err(ForgeError::SerializationError(e)) => {
                            warn!("Failed to parse streaming chunk: {}", e);
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
