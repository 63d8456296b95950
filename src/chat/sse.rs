// src/chat/sse.rs
//! Hand-rolled SSE line parser for the chat backend's event stream.
//!
//! The backend emits `event:`/`data:` lines with JSON payloads. Chunks
//! arrive at arbitrary byte boundaries, so the parser carries the trailing
//! partial line between `feed` calls. Modeled as a small explicit state
//! object so the whole protocol is unit-testable without a network stream.
//!
//! A malformed `data:` line is dropped and processing continues; a single
//! corrupted event must never abort the stream.

use serde_json::Value;

/// One typed event from the chat stream. Unknown types never surface here;
/// they are skipped during parsing for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Credit counters; absent fields keep their previous value on merge.
    Credits {
        credits_remaining: Option<u64>,
        credits_total: Option<u64>,
        daily_credits_remaining: Option<u64>,
        daily_credits_total: Option<u64>,
    },
    /// Replace the displayed status text ("status" and "thinking" events).
    Status(String),
    /// Append a text fragment to the in-progress assistant reply.
    Delta(String),
    /// Stream finished; may carry a continuation token and a full fallback
    /// answer for backends that skip incremental deltas.
    Done {
        response_id: Option<String>,
        answer: Option<String>,
    },
    /// The backend reported a failure for this turn.
    Error(String),
}

pub const GENERIC_STREAM_ERROR: &str = "Khalad ayaa dhacay. Fadlan isku day mar kale.";

/// Incremental parser state: the carried partial line plus the event name
/// recorded by the last `event:` line, consumed by the next `data:` line.
#[derive(Debug, Default)]
pub struct SseParser {
    pending_line: String,
    pending_event: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded UTF-8 chunk; returns the events completed by it.
    /// Deltas come out in receive order, never reordered or batched.
    pub fn feed(&mut self, chunk: &str) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        let mut buf = std::mem::take(&mut self.pending_line);
        buf.push_str(chunk);

        let mut rest = buf.as_str();
        while let Some(nl) = rest.find('\n') {
            let line = rest[..nl].trim_end_matches('\r');
            self.handle_line(line, &mut events);
            rest = &rest[nl + 1..];
        }
        self.pending_line = rest.to_string();
        events
    }

    /// Flush a trailing unterminated line at end of stream.
    pub fn finish(&mut self) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        if !self.pending_line.is_empty() {
            let line = std::mem::take(&mut self.pending_line);
            self.handle_line(line.trim_end_matches('\r'), &mut events);
        }
        events
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<ChatEvent>) {
        if let Some(name) = line.strip_prefix("event:") {
            self.pending_event = Some(name.trim().to_string());
            return;
        }
        let Some(payload) = line.strip_prefix("data:") else {
            return; // comments, blank lines, anything else
        };
        let payload = payload.trim();
        if payload.is_empty() || payload == "[DONE]" {
            return;
        }
        let Ok(value) = serde_json::from_str::<Value>(payload) else {
            return; // malformed line: skip, keep the stream alive
        };

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.pending_event.take())
            .unwrap_or_default()
            .to_lowercase();

        if let Some(ev) = typed_event(&kind, &value) {
            events.push(ev);
        }
    }
}

fn typed_event(kind: &str, v: &Value) -> Option<ChatEvent> {
    match kind {
        "credits" => Some(ChatEvent::Credits {
            credits_remaining: field_u64(v, "credits_remaining"),
            credits_total: field_u64(v, "credits_total"),
            daily_credits_remaining: field_u64(v, "daily_credits_remaining"),
            daily_credits_total: field_u64(v, "daily_credits_total"),
        }),
        "status" | "thinking" => Some(ChatEvent::Status(
            field_str(v, "text")
                .or_else(|| field_str(v, "status"))
                .unwrap_or_default(),
        )),
        "delta" => Some(ChatEvent::Delta(field_str(v, "text").unwrap_or_default())),
        "done" => Some(ChatEvent::Done {
            response_id: field_str(v, "response_id"),
            answer: v
                .get("response")
                .and_then(|r| r.get("answer"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        "error" => Some(ChatEvent::Error(
            field_str(v, "error").unwrap_or_else(|| GENERIC_STREAM_ERROR.to_string()),
        )),
        // Unrecognized event types are ignored (forward-compatible).
        _ => None,
    }
}

fn field_str(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

fn field_u64(v: &Value, key: &str) -> Option<u64> {
    v.get(key).and_then(Value::as_u64)
}
