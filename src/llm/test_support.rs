//! Scripted gateway shared by the session and one-shot tests.

use crate::error::{ForgeError, Result};
use crate::llm::gateway::{CompletionGateway, CompletionOptions, FragmentStream};
use crate::llm::transcript::Transcript;
use async_trait::async_trait;
use futures::stream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted exchange.
pub enum Script {
    /// Yield these fragments, then end normally.
    Reply(Vec<&'static str>),
    /// Yield these fragments, then fail as a dropped connection would.
    DropAfter(Vec<&'static str>),
    /// Fail before any fragment with a remote error.
    Remote(&'static str),
    /// Succeed with no content.
    Empty,
}

pub struct ScriptedGateway {
    scripts: Mutex<VecDeque<Script>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(Transcript, CompletionOptions)>>,
}

impl ScriptedGateway {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(Transcript, CompletionOptions)> {
        self.requests.lock().unwrap().clone()
    }

    fn next_script(&self, transcript: &Transcript, options: &CompletionOptions) -> Script {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((transcript.clone(), options.clone()));
        self.scripts.lock().unwrap().pop_front().unwrap_or(Script::Reply(vec!["default"]))
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        transcript: &Transcript,
        options: &CompletionOptions,
    ) -> Result<String> {
        match self.next_script(transcript, options) {
            Script::Reply(fragments) => Ok(fragments.concat()),
            Script::DropAfter(_) => Err(ForgeError::StreamInterrupted("dropped".to_string())),
            Script::Remote(message) => Err(ForgeError::RemoteError(message.to_string())),
            Script::Empty => Err(ForgeError::EmptyResponse),
        }
    }

    fn complete_stream<'a>(
        &'a self,
        transcript: &'a Transcript,
        options: &'a CompletionOptions,
    ) -> FragmentStream<'a> {
        let items: Vec<Result<String>> = match self.next_script(transcript, options) {
            Script::Reply(fragments) => fragments.into_iter().map(|f| Ok(f.to_string())).collect(),
            Script::DropAfter(fragments) => fragments
                .into_iter()
                .map(|f| Ok(f.to_string()))
                .chain(std::iter::once(Err(ForgeError::StreamInterrupted(
                    "connection reset".to_string(),
                ))))
                .collect(),
            Script::Remote(message) => vec![Err(ForgeError::RemoteError(message.to_string()))],
            Script::Empty => vec![],
        };
        Box::pin(stream::iter(items))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
