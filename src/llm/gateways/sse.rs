//! Line decoding for server-sent chat-completion events.
//!
//! Network reads do not respect line boundaries, and a multi-byte UTF-8
//! character can straddle two reads. [`SseLineBuffer`] keeps raw bytes until a
//! full line is available and only then decodes it. Newline bytes never occur
//! inside a multi-byte sequence, so splitting on them is safe.

use crate::error::{ForgeError, Result};
use serde_json::Value;

/// Sentinel payload that ends a completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Payload of a `data:` line
    Data(String),
    /// The end-of-stream sentinel
    Done,
}

#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning the events of every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(line);
    let data = line.trim().strip_prefix("data:")?.trim_start();

    if data == DONE_SENTINEL {
        Some(SseEvent::Done)
    } else if data.is_empty() {
        None
    } else {
        Some(SseEvent::Data(data.to_string()))
    }
}

/// Extract the content fragment from one streamed chunk.
///
/// Returns `Ok(None)` for chunks that carry no text (role headers, finish
/// markers, empty deltas). A non-null `error` in the payload is a remote error;
/// some proxies send `"error": null` on every normal chunk.
pub fn parse_delta(data: &str) -> Result<Option<String>> {
    let json: Value = serde_json::from_str(data)?;

    if let Some(error) = json.get("error").filter(|error| !error.is_null()) {
        let message = error["message"].as_str().map(String::from).unwrap_or_else(|| error.to_string());
        return Err(ForgeError::RemoteError(message));
    }

    Ok(json["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|content| !content.is_empty())
        .map(String::from))
}
