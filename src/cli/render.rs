//! Terminal output for chat turns.

use std::io::{self, Stdout, Write};

use crate::error::ForgeError;
use crate::llm::ChatSink;

/// Writes fragments to a terminal (or any writer) as they arrive.
///
/// Write failures are ignored: a closed stdout must not end the conversation.
pub struct TerminalSink<W: Write + Send = Stdout> {
    out: W,
}

impl TerminalSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    pub fn println(&mut self, text: &str) {
        self.print(text);
        self.print("\n");
    }

    /// Label printed before the assistant's reply streams in.
    pub fn reply_label(&mut self) {
        self.print("\n🔥 FORGE: ");
    }
}

impl<W: Write + Send> ChatSink for TerminalSink<W> {
    fn fragment(&mut self, text: &str) {
        self.print(text);
    }

    fn finished(&mut self, _reply: &str) {
        self.print("\n");
    }

    fn failed(&mut self, error: &ForgeError) {
        self.print(&format!("\n❌ Error: {}\n", error));
    }

    fn cancelled(&mut self) {
        self.print("\n⏹ Cancelled\n");
    }
}
