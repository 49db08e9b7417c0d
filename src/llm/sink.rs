//! Display consumers for a streaming chat turn.
//!
//! A [`ChatSink`] receives fragments synchronously as they arrive, then exactly
//! one closing call: [`ChatSink::finished`], [`ChatSink::failed`] or
//! [`ChatSink::cancelled`]. Sinks only render; they never touch the transcript.

use crate::error::ForgeError;

pub trait ChatSink: Send {
    /// A fragment of the assistant reply, in arrival order.
    fn fragment(&mut self, text: &str);

    /// The turn completed; `reply` is the concatenation of every fragment.
    fn finished(&mut self, reply: &str);

    /// The turn failed; any fragments already shown are not part of the transcript.
    fn failed(&mut self, error: &ForgeError);

    /// The turn was cancelled before the reply completed.
    fn cancelled(&mut self) {}
}

/// What a [`CollectingSink`] saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Fragment(String),
    Finished(String),
    Failed(String),
    Cancelled,
}

/// A sink that records everything it receives.
///
/// Useful for relaying a turn to a non-terminal surface after the fact.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<SinkEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All fragments received so far, joined.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Fragment(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ChatSink for CollectingSink {
    fn fragment(&mut self, text: &str) {
        self.events.push(SinkEvent::Fragment(text.to_string()));
    }

    fn finished(&mut self, reply: &str) {
        self.events.push(SinkEvent::Finished(reply.to_string()));
    }

    fn failed(&mut self, error: &ForgeError) {
        self.events.push(SinkEvent::Failed(error.to_string()));
    }

    fn cancelled(&mut self) {
        self.events.push(SinkEvent::Cancelled);
    }
}
