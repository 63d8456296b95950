// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod chat;
pub mod config;
pub mod feed;
pub mod fetcher;
pub mod metrics;
pub mod story_id;
pub mod syndication;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::chat::client::{ChatClient, ChatMessage, Role};
pub use crate::chat::sse::{ChatEvent, SseParser};
pub use crate::config::PortalConfig;
pub use crate::feed::language::LanguageProfile;
pub use crate::feed::types::{FeedPage, WireItem};
pub use crate::feed::{clean_wire_items, NormalizeOptions};
pub use crate::fetcher::{FeedQuery, Fetcher};
