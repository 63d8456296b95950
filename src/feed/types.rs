// src/feed/types.rs
use serde::{Deserialize, Serialize};

/// One news story as delivered by the upstream content backend.
///
/// The backend is a scraper; every field except `title` and `url` may be
/// missing or empty, so everything defaults. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub sentiment: String,
    #[serde(default)]
    pub published_at: String, // ISO-8601; unparseable sorts as epoch 0
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub reading_time: String, // free text, e.g. "3 daqiiqo"
}

impl WireItem {
    /// Backend-assigned id, falling back to the URL when empty.
    pub fn effective_id(&self) -> &str {
        if self.id.is_empty() {
            &self.url
        } else {
            &self.id
        }
    }
}

/// Pagination envelope produced by the fetch layer.
///
/// Invariant: `next_offset.is_some()` iff `has_more` (the fetch layer fills
/// in `offset + limit` when the backend omits the offset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<WireItem>,
    pub has_more: bool,
    pub next_offset: Option<u64>,
    pub offset: u64,
    pub limit: u64,
    #[serde(default)]
    pub total: Option<u64>,
}

impl FeedPage {
    /// Well-formed empty page; what callers get on any backend failure.
    pub fn empty(offset: u64, limit: u64) -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            next_offset: None,
            offset,
            limit,
            total: None,
        }
    }
}
