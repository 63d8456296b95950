// src/api.rs
//! HTTP surface: news relays (backend passthrough + normalization), story
//! detail route, syndication feeds, chat relay, health and metrics.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::chat::relay::relay_chat;
use crate::config::PortalConfig;
use crate::feed::language::LanguageProfile;
use crate::feed::types::WireItem;
use crate::feed::{clean_wire_items, NormalizeOptions};
use crate::fetcher::{self, Fetcher, DEFAULT_LIMIT, MAX_LIMIT};
use crate::story_id;
use crate::syndication;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<PortalConfig>,
    pub lang: Arc<LanguageProfile>,
    /// Shared client for backend calls. No global timeout: the chat relay
    /// streams indefinitely; news routes set a per-request timeout instead.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(cfg: PortalConfig, lang: LanguageProfile) -> Self {
        Self {
            cfg: Arc::new(cfg),
            lang: Arc::new(lang),
            http: reqwest::Client::new(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news/latest", get(latest_feed))
        .route("/api/news/item", get(news_item))
        .route("/api/ai/chat", post(relay_chat))
        .route("/news/{id}", get(story_detail))
        .route("/feed.xml", get(rss_feed))
        .route("/news-sitemap.xml", get(news_sitemap))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LatestParams {
    limit: Option<u64>,
    offset: Option<u64>,
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemParams {
    url: String,
    lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendLatest {
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
struct BackendItem {
    #[serde(default)]
    item: Option<WireItem>,
}

/// `GET /api/news/latest` — backend passthrough with the normalizer applied
/// to `items`. Backend failure is answered `200 ok:false` so the page layer
/// always receives a renderable payload.
async fn latest_feed(
    State(state): State<AppState>,
    Query(params): Query<LatestParams>,
) -> Response {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let lang = params.lang.as_deref().unwrap_or(&state.cfg.lang);

    let upstream = state
        .http
        .get(format!("{}/api/news/latest", state.cfg.backend_base_url))
        .query(&[
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("lang", lang.to_string()),
        ])
        .timeout(fetcher::FETCH_TIMEOUT)
        .send()
        .await;

    let page = match upstream {
        Ok(resp) => match resp.error_for_status() {
            Ok(resp) => resp.json::<BackendLatest>().await.ok(),
            Err(_) => None,
        },
        Err(_) => None,
    };

    let Some(page) = page else {
        return Json(json!({
            "ok": false,
            "items": [],
            "error": "backend_unreachable",
        }))
        .into_response();
    };

    let items = clean_wire_items(page.items, &state.lang, NormalizeOptions::default());
    Json(json!({
        "ok": true,
        "items": items,
        "has_more": page.has_more,
        "next_offset": page.next_offset,
        "offset": offset,
        "limit": limit,
        "total": page.total,
    }))
    .into_response()
}

/// `GET /api/news/item` — single-story lookup. Backend unreachability is a
/// 502 here, unlike `/latest`.
async fn news_item(State(state): State<AppState>, Query(params): Query<ItemParams>) -> Response {
    let lang = params.lang.as_deref().unwrap_or(&state.cfg.lang);
    match backend_item(&state, &params.url, lang).await {
        Some(found) => Json(json!({"ok": true, "item": found})).into_response(),
        None => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"ok": false, "error": "backend_unreachable"})),
        )
            .into_response(),
    }
}

/// `GET /news/{id}` — story detail. An id the codec rejects is a missing
/// story (404), never a server error; so is a story the backend no longer
/// has. The lookup goes through the page fetcher, which calls back into
/// this application's own `/api/news/item` relay.
async fn story_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Ok(url) = story_id::decode(&id) else {
        return story_not_found();
    };

    let fetcher = Fetcher::new(site_origin(&state, &headers), state.cfg.lang.clone());
    match fetcher.item_by_url(&url, None).await {
        Some(item) => Json(json!({"ok": true, "item": item})).into_response(),
        None => story_not_found(),
    }
}

/// `GET /feed.xml` — RSS over normalized items with the strict Somali gate.
/// Fetches a full backend page so the gate still has 50 items to pick from.
async fn rss_feed(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let items = backend_latest_items(&state, MAX_LIMIT as usize).await;
    let items = clean_wire_items(items, &state.lang, NormalizeOptions { only_somali: true });
    let origin = site_origin(&state, &headers);
    let xml = syndication::rss_feed(&items, &origin);
    xml_response(xml, "application/rss+xml; charset=utf-8")
}

/// `GET /news-sitemap.xml` — Google-News sitemap, 2-day window.
async fn news_sitemap(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let items = backend_latest_items(&state, syndication::SITEMAP_MAX_URLS).await;
    let items = clean_wire_items(items, &state.lang, NormalizeOptions::default());
    let origin = site_origin(&state, &headers);
    let xml = syndication::news_sitemap(&items, &origin, chrono::Utc::now());
    xml_response(xml, "application/xml; charset=utf-8")
}

fn story_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"ok": false, "error": "story_not_found"})),
    )
        .into_response()
}

fn xml_response(xml: String, content_type: &'static str) -> Response {
    ([(header::CONTENT_TYPE, content_type)], xml).into_response()
}

/// Up to `max_items` items from the backend, paginating in `MAX_LIMIT`
/// chunks. A failed page stops the walk and keeps what was collected, so
/// the syndication routes still serve a valid (possibly partial) document.
async fn backend_latest_items(state: &AppState, max_items: usize) -> Vec<WireItem> {
    let mut out: Vec<WireItem> = Vec::new();
    let mut offset: u64 = 0;

    while out.len() < max_items {
        let limit = MAX_LIMIT.min((max_items - out.len()) as u64);
        let upstream = state
            .http
            .get(format!("{}/api/news/latest", state.cfg.backend_base_url))
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("lang", state.cfg.lang.clone()),
            ])
            .timeout(fetcher::FETCH_TIMEOUT)
            .send()
            .await;

        let page = match upstream {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => resp.json::<BackendLatest>().await.ok(),
                Err(_) => None,
            },
            Err(_) => None,
        };
        let Some(page) = page else { break };
        if page.items.is_empty() {
            break;
        }

        offset += page.items.len() as u64;
        out.extend(page.items);
        if !page.has_more {
            break;
        }
    }

    out.truncate(max_items);
    out
}

async fn backend_item(state: &AppState, url: &str, lang: &str) -> Option<WireItem> {
    let resp = state
        .http
        .get(format!("{}/api/news/item", state.cfg.backend_base_url))
        .query(&[("url", url), ("lang", lang)])
        .timeout(fetcher::FETCH_TIMEOUT)
        .send()
        .await
        .ok()?
        .error_for_status()
        .ok()?;
    let parsed = resp.json::<BackendItem>().await.ok()?;
    parsed.item.map(|mut it| {
        it.title = crate::feed::sanitize_title(&it.title);
        it
    })
}

/// Inbound proto/host from forwarded headers, when present.
fn inbound_pair(headers: &HeaderMap) -> Option<(String, String)> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())?;
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    Some((proto.to_string(), host.to_string()))
}

fn site_origin(state: &AppState, headers: &HeaderMap) -> String {
    let pair = inbound_pair(headers);
    fetcher::resolve_origin(
        pair.as_ref().map(|(p, h)| (p.as_str(), h.as_str())),
        Some(&state.cfg.site_base_url),
    )
}
