//! Incremental SSE decoding for streamed turns.

use serde_json::Value;
use tracing::{trace, warn};

use crate::provider::LlmError;
use crate::types::TurnResponseStreamChunk;

/// Splits a byte stream into SSE events and collects their `data` payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks are decoded intact.
pub(super) struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub(super) fn new() -> Self {
        Self {
            buffer: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Append bytes and return the payload of every event they complete.
    pub(super) fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();

        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&raw[..newline_pos]);
            let line = line.trim_end_matches('\r');
            self.process_line(line, &mut payloads);
        }

        payloads
    }

    /// Flush a trailing event that was not terminated by a blank line.
    pub(super) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let mut payloads = Vec::new();
        if !rest.is_empty() {
            let line = String::from_utf8_lossy(&rest);
            self.process_line(line.trim_end_matches('\r'), &mut payloads);
        }
        if !self.data.is_empty() {
            payloads.push(self.data.join("\n"));
            self.data.clear();
        }
        payloads.pop()
    }

    fn process_line(&mut self, line: &str, payloads: &mut Vec<String>) {
        if line.is_empty() {
            if !self.data.is_empty() {
                payloads.push(self.data.join("\n"));
                self.data.clear();
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        } else {
            // event:, id: and retry: carry nothing the turn protocol uses
            trace!(line, "ignoring SSE field");
        }
    }
}

/// Decode one event payload into a turn chunk.
///
/// Returns `None` for the `[DONE]` sentinel and for well-formed JSON that
/// does not look like a turn chunk, which is logged and skipped. An
/// `{"error": ...}` payload becomes a stream error.
pub(super) fn decode_payload(payload: &str) -> Option<Result<TurnResponseStreamChunk, LlmError>> {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => return Some(Err(LlmError::ParseError(format!("invalid chunk JSON: {}", e)))),
    };

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Some(Err(LlmError::StreamError(message)));
    }

    match serde_json::from_value(value) {
        Ok(chunk) => Some(Ok(chunk)),
        Err(e) => {
            warn!(error = %e, "skipping turn chunk with unexpected shape");
            None
        }
    }
}
