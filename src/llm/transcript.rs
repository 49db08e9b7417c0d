//! Ordered, append-only conversation history.
//!
//! A [`Transcript`] always starts with exactly one system turn holding the
//! assistant's operating instructions. That turn is placed at construction and
//! never removed; every later turn is a user or assistant turn appended at the
//! end. Alternation between user and assistant is not enforced: whatever the
//! transcript holds is what the gateway replays.

use crate::error::{ForgeError, Result};
use crate::llm::models::{Role, Turn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Turn>", into = "Vec<Turn>")]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create a transcript holding only the system turn.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
        }
    }

    /// Append a user turn.
    pub fn append_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Append an assistant turn.
    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// Append an already-built turn.
    ///
    /// Fails with [`ForgeError::InvalidTurn`] for system turns; the only system
    /// turn is the one the transcript was created with.
    pub fn append(&mut self, turn: Turn) -> Result<()> {
        if turn.role() == Role::System {
            return Err(ForgeError::InvalidTurn(
                "a transcript holds exactly one system turn".to_string(),
            ));
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Content of the leading system turn.
    pub fn system_prompt(&self) -> &str {
        self.turns[0].content()
    }

    /// All turns in order, system turn first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn; the system turn when nothing has been appended.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns, including the system turn.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the system turn is never removed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl TryFrom<Vec<Turn>> for Transcript {
    type Error = ForgeError;

    fn try_from(turns: Vec<Turn>) -> Result<Self> {
        match turns.first() {
            Some(first) if first.role() == Role::System => {}
            _ => {
                return Err(ForgeError::InvalidTurn(
                    "a transcript must start with a system turn".to_string(),
                ))
            }
        }
        if turns.iter().filter(|t| t.role() == Role::System).count() > 1 {
            return Err(ForgeError::InvalidTurn(
                "a transcript holds exactly one system turn".to_string(),
            ));
        }
        Ok(Self { turns })
    }
}

impl From<Transcript> for Vec<Turn> {
    fn from(transcript: Transcript) -> Self {
        transcript.turns
    }
}
