//! Streaming chat sessions.
//!
//! A [`ChatSession`] owns one [`Transcript`] and drives it through a small state
//! machine:
//!
//! ```text
//! Idle -> AwaitingInput -> Dispatching -> Streaming -> AwaitingInput ...
//!                      \-> Exited (on the exit keyword)
//! ```
//!
//! Each turn appends the user input, streams the reply through the gateway,
//! forwards every fragment to a [`ChatSink`], and appends the assembled reply
//! only once the stream has completed. A failed or cancelled turn keeps the
//! user turn and adds nothing else, so a half-formed answer never reaches the
//! context of later turns. The session never retries on its own.

use crate::error::{ForgeError, Result};
use crate::llm::gateway::{CompletionGateway, CompletionOptions, FragmentStream};
use crate::llm::prompts::ASSISTANT_PERSONA;
use crate::llm::sink::ChatSink;
use crate::llm::transcript::Transcript;
use futures::stream::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Input that ends a session, matched case-insensitively.
pub const EXIT_KEYWORD: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    Dispatching,
    Streaming,
    Exited,
}

/// How a single call to [`ChatSession::handle_input`] ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The reply completed and was appended to the transcript.
    Replied(String),
    /// The exchange failed; the session is ready for the next input.
    Failed(ForgeError),
    /// The exchange was cancelled mid-stream; the session is ready for the next input.
    Cancelled,
    /// The exit keyword was received; no request was made.
    Exited,
}

enum StreamEnd {
    Completed(String),
    Failed(ForgeError),
    Cancelled,
}

/// A conversation with a remote model.
///
/// # Examples
///
/// ```ignore
/// use forge::llm::{ChatSession, CollectingSink};
/// use forge::llm::gateways::DeepSeekGateway;
/// use std::sync::Arc;
///
/// let gateway = Arc::new(DeepSeekGateway::from_env()?);
/// let mut session = ChatSession::new(gateway);
/// let mut sink = CollectingSink::new();
///
/// session.handle_input("hello", &mut sink).await?;
/// ```
pub struct ChatSession {
    id: Uuid,
    gateway: Arc<dyn CompletionGateway>,
    transcript: Transcript,
    options: CompletionOptions,
    exit_keyword: String,
    state: SessionState,
}

impl ChatSession {
    /// Create a session with the assistant persona and conversational options.
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self::builder(gateway).build()
    }

    pub fn builder(gateway: Arc<dyn CompletionGateway>) -> ChatSessionBuilder {
        ChatSessionBuilder::new(gateway)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn model(&self) -> &str {
        self.gateway.model()
    }

    /// Move from `Idle` to `AwaitingInput`. Has no effect in any other state.
    pub fn start(&mut self) {
        if self.state == SessionState::Idle {
            debug!(session = %self.id, "Session awaiting input");
            self.state = SessionState::AwaitingInput;
        }
    }

    pub fn is_exit_command(&self, input: &str) -> bool {
        input.eq_ignore_ascii_case(&self.exit_keyword)
    }

    /// Run one turn for `input`, streaming the reply to `sink`.
    ///
    /// Exchange failures come back as [`TurnOutcome::Failed`]; the returned
    /// `Err` is reserved for [`ForgeError::SessionClosed`].
    pub async fn handle_input(
        &mut self,
        input: &str,
        sink: &mut dyn ChatSink,
    ) -> Result<TurnOutcome> {
        self.handle_input_until(input, sink, std::future::pending()).await
    }

    /// Like [`handle_input`](Self::handle_input), but abandons the turn as soon
    /// as `cancel` completes. Partial text is discarded on cancellation.
    pub async fn handle_input_until<C>(
        &mut self,
        input: &str,
        sink: &mut dyn ChatSink,
        cancel: C,
    ) -> Result<TurnOutcome>
    where
        C: Future<Output = ()>,
    {
        self.prepare_for_input()?;

        if self.is_exit_command(input) {
            info!(session = %self.id, "Session exited");
            self.state = SessionState::Exited;
            return Ok(TurnOutcome::Exited);
        }

        self.state = SessionState::Dispatching;
        self.transcript.append_user(input);
        self.state = SessionState::Streaming;
        info!(session = %self.id, turns = self.transcript.len(), "Dispatching turn");

        let end = {
            let gateway = Arc::clone(&self.gateway);
            let mut stream = gateway.complete_stream(&self.transcript, &self.options);
            let mut reply = String::new();
            tokio::pin!(cancel);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel => break StreamEnd::Cancelled,
                    next = stream.next() => match next {
                        Some(Ok(fragment)) => {
                            sink.fragment(&fragment);
                            reply.push_str(&fragment);
                        }
                        Some(Err(e)) => break StreamEnd::Failed(e),
                        None => break StreamEnd::Completed(reply),
                    },
                }
            }
        };

        self.state = SessionState::AwaitingInput;
        match end {
            StreamEnd::Completed(reply) => {
                self.transcript.append_assistant(reply.as_str());
                sink.finished(&reply);
                Ok(TurnOutcome::Replied(reply))
            }
            StreamEnd::Failed(e) => {
                warn!(session = %self.id, "Discarding partial reply: {}", e);
                sink.failed(&e);
                Ok(TurnOutcome::Failed(e))
            }
            StreamEnd::Cancelled => {
                warn!(session = %self.id, "Turn cancelled, discarding partial reply");
                sink.cancelled();
                Ok(TurnOutcome::Cancelled)
            }
        }
    }

    /// Send a message and pull the reply as a stream of fragments.
    ///
    /// The user turn is appended immediately. The assistant turn is appended
    /// only when the stream has been consumed to its end without error; a
    /// stream that fails or is dropped early leaves no assistant turn behind.
    /// The exit keyword has no special meaning here.
    ///
    /// ```ignore
    /// use futures::stream::StreamExt;
    ///
    /// let mut stream = session.send_stream("Tell me a story");
    /// while let Some(result) = stream.next().await {
    ///     print!("{}", result?);
    /// }
    /// ```
    pub fn send_stream<'a>(&'a mut self, query: &str) -> FragmentStream<'a> {
        if let Err(e) = self.prepare_for_input() {
            return Box::pin(futures::stream::once(async move { Err::<String, ForgeError>(e) }));
        }

        self.state = SessionState::Dispatching;
        self.transcript.append_user(query);
        self.state = SessionState::Streaming;

        Box::pin(async_stream::stream! {
            let gateway = Arc::clone(&self.gateway);
            let mut accumulated = String::new();
            let mut failed = false;

            {
                let mut inner_stream = gateway.complete_stream(&self.transcript, &self.options);
                while let Some(result) = inner_stream.next().await {
                    match result {
                        Ok(fragment) => {
                            accumulated.push_str(&fragment);
                            yield Ok(fragment);
                        }
                        Err(e) => {
                            failed = true;
                            yield Err(e);
                            break;
                        }
                    }
                }
            }

            if failed {
                warn!(session = %self.id, "Discarding partial reply");
            } else {
                self.transcript.append_assistant(accumulated);
            }
            self.state = SessionState::AwaitingInput;
        })
    }

    fn prepare_for_input(&mut self) -> Result<()> {
        match self.state {
            SessionState::Exited => Err(ForgeError::SessionClosed),
            SessionState::Idle => {
                self.start();
                Ok(())
            }
            SessionState::AwaitingInput => Ok(()),
            SessionState::Dispatching | SessionState::Streaming => {
                // Only reachable when a previous turn's future or stream was dropped.
                warn!(session = %self.id, "Previous turn was abandoned");
                self.state = SessionState::AwaitingInput;
                Ok(())
            }
        }
    }
}

/// Builder for constructing a `ChatSession` with custom configuration.
pub struct ChatSessionBuilder {
    gateway: Arc<dyn CompletionGateway>,
    system_prompt: String,
    options: CompletionOptions,
    exit_keyword: String,
}

impl ChatSessionBuilder {
    fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway,
            system_prompt: ASSISTANT_PERSONA.to_string(),
            options: CompletionOptions::conversation(),
            exit_keyword: EXIT_KEYWORD.to_string(),
        }
    }

    /// Set the system prompt (default: the FORGE assistant persona)
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the completion options used for every turn
    pub fn options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the configured conversational temperature
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    /// Set the exit keyword (default: "exit")
    pub fn exit_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.exit_keyword = keyword.into();
        self
    }

    pub fn build(self) -> ChatSession {
        ChatSession {
            id: Uuid::new_v4(),
            gateway: self.gateway,
            transcript: Transcript::new(self.system_prompt),
            options: self.options,
            exit_keyword: self.exit_keyword,
            state: SessionState::Idle,
        }
    }
}

/// A session handle that several producers (for example web requests) can share.
///
/// Turns never interleave: [`send`](Self::send) waits for the in-flight turn to
/// finish, [`try_send`](Self::try_send) rejects with [`ForgeError::SessionBusy`].
#[derive(Clone)]
pub struct SharedChatSession {
    inner: Arc<tokio::sync::Mutex<ChatSession>>,
}

impl SharedChatSession {
    pub fn new(session: ChatSession) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(session)),
        }
    }

    /// Queue `input` behind any in-flight turn.
    pub async fn send(&self, input: &str, sink: &mut dyn ChatSink) -> Result<TurnOutcome> {
        let mut session = self.inner.lock().await;
        session.handle_input(input, sink).await
    }

    /// Run `input` now, or fail with [`ForgeError::SessionBusy`] if a turn is in flight.
    pub async fn try_send(&self, input: &str, sink: &mut dyn ChatSink) -> Result<TurnOutcome> {
        let mut session = self.inner.try_lock().map_err(|_| ForgeError::SessionBusy)?;
        session.handle_input(input, sink).await
    }

    /// A copy of the transcript as of the last completed turn.
    pub async fn transcript(&self) -> Transcript {
        self.inner.lock().await.transcript().clone()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state()
    }
}
