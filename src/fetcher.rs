// src/fetcher.rs
//! Server-side page fetcher.
//!
//! Pages do not call the upstream backend directly; they call back into
//! this application's own relay routes so auth/headers/caching live in one
//! place. The fetcher hides pagination and origin resolution, and never
//! errors: any transport or parse failure degrades to an empty page or
//! `None`, which pages render as an empty-list placeholder.

use std::time::Duration;

use anyhow::{Context, Result};
use metrics::counter;
use serde::Deserialize;

use crate::config::DEFAULT_SITE_URL;
use crate::feed::types::{FeedPage, WireItem};

/// Bounded timeout for page-data fetches; timeout == network failure.
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(6_500);

pub const DEFAULT_LIMIT: u64 = 60;
pub const MAX_LIMIT: u64 = 200;

/// Query for one page of the latest feed. Missing values take defaults;
/// out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lang: Option<String>,
}

impl FeedQuery {
    fn effective_limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    fn effective_offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

/// Effective site origin for self-calls: the inbound request's host wins,
/// then the configured site URL, then the production fallback.
pub fn resolve_origin(inbound: Option<(&str, &str)>, configured: Option<&str>) -> String {
    if let Some((proto, host)) = inbound {
        if !host.is_empty() {
            return format!("{}://{}", proto, host);
        }
    }
    match configured {
        Some(c) if !c.is_empty() => c.trim_end_matches('/').to_string(),
        _ => DEFAULT_SITE_URL.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    items: Vec<WireItem>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_offset: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(default)]
    item: Option<WireItem>,
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    origin: String,
    default_lang: String,
}

impl Fetcher {
    /// `origin` is the base URL of this application's own API surface.
    pub fn new(origin: impl Into<String>, default_lang: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
            default_lang: default_lang.into(),
        }
    }

    /// One page of the latest feed. Never errors; a backend 500, network
    /// failure, timeout, or malformed payload yields an empty page.
    pub async fn latest_page(&self, q: &FeedQuery) -> FeedPage {
        let limit = q.effective_limit();
        let offset = q.effective_offset();
        let lang = q.lang.as_deref().unwrap_or(&self.default_lang);

        match self.get_latest(limit, offset, lang).await {
            Ok(resp) => {
                let next_offset = if resp.has_more {
                    Some(resp.next_offset.unwrap_or(offset + limit))
                } else {
                    None
                };
                FeedPage {
                    items: resp.items,
                    has_more: resp.has_more,
                    next_offset,
                    offset,
                    limit,
                    total: resp.total,
                }
            }
            Err(e) => {
                tracing::warn!(error = ?e, offset, limit, "latest feed fetch failed");
                counter!("fetch_failures_total").increment(1);
                FeedPage::empty(offset, limit)
            }
        }
    }

    /// Convenience: just the items of the first page.
    pub async fn latest(&self, limit: u64, lang: Option<&str>) -> Vec<WireItem> {
        let q = FeedQuery {
            limit: Some(limit),
            offset: None,
            lang: lang.map(str::to_string),
        };
        self.latest_page(&q).await.items
    }

    /// Single-item lookup by source URL. `None` on any failure: network,
    /// non-2xx, or a payload without an `item` field.
    pub async fn item_by_url(&self, url: &str, lang: Option<&str>) -> Option<WireItem> {
        let lang = lang.unwrap_or(&self.default_lang);
        match self.get_item(url, lang).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = ?e, "item lookup failed");
                counter!("fetch_failures_total").increment(1);
                None
            }
        }
    }

    async fn get_latest(&self, limit: u64, offset: u64, lang: &str) -> Result<LatestResponse> {
        let resp = self
            .client
            .get(format!("{}/api/news/latest", self.origin))
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("lang", lang.to_string()),
            ])
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .context("latest feed http get")?;
        let resp = resp.error_for_status().context("latest feed status")?;
        resp.json::<LatestResponse>().await.context("latest feed json")
    }

    async fn get_item(&self, url: &str, lang: &str) -> Result<Option<WireItem>> {
        let resp = self
            .client
            .get(format!("{}/api/news/item", self.origin))
            .query(&[("url", url), ("lang", lang)])
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .context("item http get")?;
        let resp = resp.error_for_status().context("item status")?;
        let parsed = resp.json::<ItemResponse>().await.context("item json")?;
        Ok(parsed.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamps_into_range() {
        let q = FeedQuery {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(q.effective_limit(), 200);
        let q = FeedQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(q.effective_limit(), 1);
        let q = FeedQuery::default();
        assert_eq!(q.effective_limit(), 60);
    }

    #[test]
    fn origin_prefers_inbound_then_config_then_fallback() {
        assert_eq!(
            resolve_origin(Some(("https", "portal.example.com")), Some("https://cfg")),
            "https://portal.example.com"
        );
        assert_eq!(
            resolve_origin(None, Some("https://cfg.example.com/")),
            "https://cfg.example.com"
        );
        assert_eq!(resolve_origin(None, None), DEFAULT_SITE_URL);
        assert_eq!(resolve_origin(Some(("https", "")), None), DEFAULT_SITE_URL);
    }
}
