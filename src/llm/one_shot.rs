//! Stateless single-exchange queries.
//!
//! Each call builds a throwaway two-turn transcript (persona + user) and keeps
//! nothing afterwards.

use crate::error::Result;
use crate::llm::gateway::{recover_empty, CompletionGateway, CompletionOptions, FragmentStream};
use crate::llm::prompts::{with_file_context, ASSISTANT_PERSONA, GENERATOR_PERSONA};
use crate::llm::transcript::Transcript;
use futures::stream::StreamExt;
use std::sync::Arc;
use tracing::info;

pub struct OneShotQuery {
    gateway: Arc<dyn CompletionGateway>,
}

impl OneShotQuery {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }

    /// Ask a question, optionally with framed file excerpts as context.
    ///
    /// An endpoint that answers without content yields an empty string.
    pub async fn ask(&self, question: &str, context_blocks: &[String]) -> Result<String> {
        info!(context_blocks = context_blocks.len(), "One-shot ask");
        self.consult(ASSISTANT_PERSONA, &with_file_context(question, context_blocks)).await
    }

    /// Streaming form of [`ask`](Self::ask).
    pub fn ask_stream(&self, question: &str, context_blocks: &[String]) -> FragmentStream<'_> {
        info!(context_blocks = context_blocks.len(), "One-shot streaming ask");
        self.consult_stream(ASSISTANT_PERSONA, &with_file_context(question, context_blocks))
    }

    /// Send `prompt` under an arbitrary persona with conversational options.
    pub async fn consult(&self, persona: &str, prompt: &str) -> Result<String> {
        let transcript = single_turn(persona, prompt);
        recover_empty(self.gateway.complete(&transcript, &CompletionOptions::conversation()).await)
    }

    pub fn consult_stream(&self, persona: &str, prompt: &str) -> FragmentStream<'_> {
        let transcript = single_turn(persona, prompt);
        let gateway = Arc::clone(&self.gateway);

        Box::pin(async_stream::stream! {
            let options = CompletionOptions::conversation();
            let mut inner = gateway.complete_stream(&transcript, &options);
            while let Some(item) = inner.next().await {
                yield item;
            }
        })
    }

    /// Generate an artifact (code, scaffolds) from a prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        info!("One-shot generate");
        let transcript = single_turn(GENERATOR_PERSONA, prompt);
        recover_empty(self.gateway.complete(&transcript, &CompletionOptions::generation()).await)
    }
}

fn single_turn(persona: &str, prompt: &str) -> Transcript {
    let mut transcript = Transcript::new(persona);
    transcript.append_user(prompt);
    transcript
}
