// src/chat/client.rs
//! Chat turn state machine.
//!
//! Drives one `send_message` call from user input to final assistant text,
//! across either a plain-JSON response or an SSE stream, while keeping the
//! conversation continuation token and credit counters across turns.
//!
//! Failure policy: a failed turn becomes a visibly-errored assistant
//! message in the transcript; it never tears down the transcript and never
//! blocks the next turn.

use futures_util::StreamExt;
use serde_json::json;
use tracing::debug;

use crate::chat::sse::{ChatEvent, SseParser, GENERIC_STREAM_ERROR};

/// Number of prior messages replayed to the backend per turn.
const HISTORY_WINDOW: usize = 8;

const GENERIC_CONNECTIVITY_ERROR: &str =
    "Khalad xiriir ayaa dhacay. Fadlan isku day mar kale.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn in the transcript. Assistant text grows via streamed deltas.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub error: bool,
}

/// Cross-turn conversation state; ephemeral, per client instance.
#[derive(Debug, Default)]
pub struct ConversationState {
    pub previous_response_id: Option<String>,
    pub credits_remaining: Option<u64>,
    pub credits_total: Option<u64>,
    pub daily_credits_remaining: Option<u64>,
    pub daily_credits_total: Option<u64>,
    pub status: Option<String>,
    pub sending: bool,
}

pub struct ChatClient {
    relay_url: String,
    lang: String,
    client: reqwest::Client,
    pub transcript: Vec<ChatMessage>,
    pub conversation: ConversationState,
    next_id: u64,
}

impl ChatClient {
    /// `relay_url` is the full URL of the same-origin chat relay endpoint.
    pub fn new(relay_url: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            lang: lang.into(),
            client: reqwest::Client::new(),
            transcript: Vec::new(),
            conversation: ConversationState::default(),
            next_id: 0,
        }
    }

    /// Run one chat turn. No-op when the prompt is blank or a send is
    /// already in flight. Never returns an error: failures end up in the
    /// transcript as an errored assistant message.
    pub async fn send_message(&mut self, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() || self.conversation.sending {
            return;
        }
        self.conversation.sending = true;
        debug!(target: "chat", prompt_id = %anon_hash(prompt), "chat turn start");

        let history = self.history_payload();
        self.push_message(Role::User, prompt.to_string());
        let assistant = self.push_message(Role::Assistant, String::new());

        let mut body = json!({
            "message": prompt,
            "lang": self.lang,
            "history": history,
        });
        if let Some(prev) = &self.conversation.previous_response_id {
            body["previous_response_id"] = json!(prev);
        }

        let resp = self
            .client
            .post(&self.relay_url)
            .header(reqwest::header::ACCEPT, "text/event-stream,application/json")
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(resp) if is_event_stream(&resp) => self.consume_stream(resp, assistant).await,
            Ok(resp) => self.consume_plain(resp, assistant).await,
            Err(e) => {
                debug!(target: "chat", error = ?e, "chat turn transport failure");
                self.fail_turn(assistant, GENERIC_CONNECTIVITY_ERROR.to_string());
            }
        }

        // Turn over: drop the sending flag and any stuck mid-flight status.
        self.conversation.sending = false;
        self.conversation.status = None;
    }

    /// Apply one stream event to the transcript and conversation state.
    /// Deltas are applied strictly in receive order.
    pub fn apply_event(&mut self, assistant: usize, ev: ChatEvent) {
        match ev {
            ChatEvent::Credits {
                credits_remaining,
                credits_total,
                daily_credits_remaining,
                daily_credits_total,
            } => {
                // Merge: fields absent in this event keep previous values.
                let c = &mut self.conversation;
                c.credits_remaining = credits_remaining.or(c.credits_remaining);
                c.credits_total = credits_total.or(c.credits_total);
                c.daily_credits_remaining = daily_credits_remaining.or(c.daily_credits_remaining);
                c.daily_credits_total = daily_credits_total.or(c.daily_credits_total);
            }
            ChatEvent::Status(text) => {
                self.conversation.status = Some(text);
            }
            ChatEvent::Delta(text) => {
                if let Some(msg) = self.transcript.get_mut(assistant) {
                    msg.text.push_str(&text);
                }
            }
            ChatEvent::Done {
                response_id,
                answer,
            } => {
                if let Some(id) = response_id {
                    self.conversation.previous_response_id = Some(id);
                }
                if let Some(msg) = self.transcript.get_mut(assistant) {
                    // Fallback for backends that skip incremental deltas.
                    if msg.text.is_empty() {
                        if let Some(full) = answer {
                            msg.text = full;
                        }
                    }
                }
                self.conversation.status = None;
            }
            ChatEvent::Error(text) => {
                self.fail_turn(assistant, text);
                self.conversation.status = None;
            }
        }
    }

    async fn consume_stream(&mut self, resp: reqwest::Response, assistant: usize) {
        let mut parser = SseParser::new();
        let mut carry = Utf8Carry::default();
        let mut stream = resp.bytes_stream();

        while let Some(next) = stream.next().await {
            match next {
                Ok(bytes) => {
                    let chunk = carry.push(&bytes);
                    for ev in parser.feed(&chunk) {
                        self.apply_event(assistant, ev);
                    }
                }
                Err(e) => {
                    debug!(target: "chat", error = ?e, "chat stream aborted");
                    self.fail_turn(assistant, GENERIC_CONNECTIVITY_ERROR.to_string());
                    return;
                }
            }
        }
        for ev in parser.finish() {
            self.apply_event(assistant, ev);
        }
    }

    async fn consume_plain(&mut self, resp: reqwest::Response, assistant: usize) {
        let status = resp.status();
        let body = match resp.text().await {
            Ok(t) => t,
            Err(_) => {
                self.fail_turn(assistant, GENERIC_CONNECTIVITY_ERROR.to_string());
                return;
            }
        };

        let parsed = serde_json::from_str::<serde_json::Value>(&body).ok();
        let answer = parsed
            .as_ref()
            .and_then(|v| v.get("answer"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let error = parsed
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        match (answer, error) {
            (_, Some(err)) => self.fail_turn(assistant, err),
            (Some(ans), None) if status.is_success() => {
                if let Some(msg) = self.transcript.get_mut(assistant) {
                    msg.text = ans;
                }
                if let Some(id) = parsed
                    .as_ref()
                    .and_then(|v| v.get("response_id"))
                    .and_then(|v| v.as_str())
                {
                    self.conversation.previous_response_id = Some(id.to_string());
                }
            }
            (Some(ans), None) => self.fail_turn(assistant, ans),
            (None, None) => {
                self.fail_turn(assistant, format!("Request failed ({})", status.as_u16()))
            }
        }
    }

    fn fail_turn(&mut self, assistant: usize, text: String) {
        if let Some(msg) = self.transcript.get_mut(assistant) {
            msg.error = true;
            msg.text = if text.is_empty() {
                GENERIC_STREAM_ERROR.to_string()
            } else {
                text
            };
        }
    }

    /// Last `HISTORY_WINDOW` non-empty prior messages as `{role, content}`.
    fn history_payload(&self) -> Vec<serde_json::Value> {
        self.transcript
            .iter()
            .filter(|m| !m.text.trim().is_empty())
            .rev()
            .take(HISTORY_WINDOW)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|m| json!({"role": m.role.as_str(), "content": m.text}))
            .collect()
    }

    fn push_message(&mut self, role: Role, text: String) -> usize {
        self.next_id += 1;
        self.transcript.push(ChatMessage {
            id: format!("msg-{}", self.next_id),
            role,
            text,
            error: false,
        });
        self.transcript.len() - 1
    }
}

fn is_event_stream(resp: &reqwest::Response) -> bool {
    resp.headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("text/event-stream"))
        .unwrap_or(false)
}

/// Incremental UTF-8 decoding over arbitrary byte-chunk boundaries: bytes
/// of a split code point carry over to the next chunk.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(s) => {
                let out = s.to_string();
                self.pending.clear();
                out
            }
            Err(e) => {
                let valid = e.valid_up_to();
                let out = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                // Cap the carry: anything longer than a code point is not a
                // split character but corrupt input; drop it.
                if self.pending.len() > 4 {
                    self.pending.clear();
                }
                out
            }
        }
    }
}

/// Short stable hash for privacy-safe logging; raw prompts are never logged.
fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
