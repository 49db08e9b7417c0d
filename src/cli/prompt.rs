//! Line input for the chat REPL.
//!
//! The line editor blocks, so it lives on its own OS thread and answers read
//! requests over channels. A read still blocked on the terminal when the REPL
//! returns does not keep the process alive.

use async_trait::async_trait;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::oneshot;
use tracing::warn;

/// Prompt shown before reading user input.
pub const USER_PROMPT: &str = "🔮 You: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C at the prompt
    Interrupted,
    /// Ctrl-D or end of input
    Eof,
    Failed(String),
}

/// Somewhere the REPL reads its next line from.
#[async_trait]
pub trait LineSource: Send {
    async fn read_line(&mut self, prompt: &str) -> ReadOutcome;
}

type ReadRequest = (String, oneshot::Sender<ReadOutcome>);

/// `rustyline` editor running on a dedicated thread.
///
/// Dropping a pending [`read_line`](LineSource::read_line) future does not
/// abort the read; its line is discarded when it arrives.
pub struct LineEditor {
    requests: std_mpsc::Sender<ReadRequest>,
}

impl LineEditor {
    pub fn spawn() -> std::io::Result<Self> {
        let (requests, incoming) = std_mpsc::channel::<ReadRequest>();

        thread::Builder::new().name("forge-line-editor".to_string()).spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => Some(editor),
                Err(e) => {
                    warn!("Line editor unavailable: {}", e);
                    None
                }
            };

            for (prompt, reply) in incoming {
                let outcome = match editor.as_mut() {
                    Some(editor) => read(editor, &prompt),
                    None => ReadOutcome::Failed("line editor unavailable".to_string()),
                };
                let _ = reply.send(outcome);
            }
        })?;

        Ok(Self { requests })
    }
}

fn read(editor: &mut DefaultEditor, prompt: &str) -> ReadOutcome {
    match editor.readline(prompt) {
        Ok(line) => {
            let _ = editor.add_history_entry(line.as_str());
            ReadOutcome::Line(line)
        }
        Err(ReadlineError::Interrupted) => ReadOutcome::Interrupted,
        Err(ReadlineError::Eof) => ReadOutcome::Eof,
        Err(e) => ReadOutcome::Failed(e.to_string()),
    }
}

#[async_trait]
impl LineSource for LineEditor {
    async fn read_line(&mut self, prompt: &str) -> ReadOutcome {
        let (reply, outcome) = oneshot::channel();
        if self.requests.send((prompt.to_string(), reply)).is_err() {
            return ReadOutcome::Eof;
        }
        outcome.await.unwrap_or(ReadOutcome::Eof)
    }
}
