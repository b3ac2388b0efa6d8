//! Server-sent-events decoding for chat-completions streams.
//!
//! Two steps: [`SseLineBuffer`] splits the raw byte stream into `data:`
//! payloads, and [`parse_payload`] turns one payload into typed frames.
//! Unparseable payloads are reported as [`SsePayload::Malformed`] so the
//! caller can skip them without aborting the stream.

use laid_core::provider::{StreamFrame, ToolCallDelta};
use serde::Deserialize;

/// Accumulates bytes and yields complete `data:` payloads.
///
/// Bytes are buffered undecoded until a full line is available, so a
/// multi-byte character split across network chunks is decoded intact.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns the payloads of every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            // Skip blank separators and SSE comments
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim().to_string());
            }
        }
        payloads
    }

    /// Whatever is left once the byte stream closes.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        let rest = String::from_utf8_lossy(&rest);
        rest.trim()
            .strip_prefix("data:")
            .map(|data| data.trim().to_string())
    }
}

/// The meaning of one `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsePayload {
    /// The `[DONE]` terminal marker
    Done,

    /// Zero or more frames decoded from a JSON chunk
    Frames(Vec<StreamFrame>),

    /// Not a chunk we understand; carries the parse error
    Malformed(String),
}

/// Decode one payload into frames.
///
/// Content comes before tool-call deltas when a chunk carries both.
pub fn parse_payload(data: &str) -> SsePayload {
    if data == "[DONE]" {
        return SsePayload::Done;
    }

    let chunk: StreamResponse = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => return SsePayload::Malformed(e.to_string()),
    };

    let mut frames = Vec::new();
    if let Some(choice) = chunk.choices.into_iter().next() {
        let delta = choice.delta;

        if let Some(text) = delta.content
            && !text.is_empty()
        {
            frames.push(StreamFrame::Content { text });
        }

        for tc in delta.tool_calls.unwrap_or_default() {
            let (name, arguments) = match tc.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            frames.push(StreamFrame::ToolCallDelta(ToolCallDelta {
                index: tc.index,
                id: tc.id,
                name,
                arguments,
            }));
        }
    }

    SsePayload::Frames(frames)
}

// --- Streaming chunk types (internal) ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

/// A tool call delta: arrives incrementally across chunks.
#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}
