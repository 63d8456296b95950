// src/chat/relay.rs
//! Transparent streaming passthrough for `POST /api/ai/chat`.
//!
//! The relay forwards the inbound body to the backend chat endpoint
//! unchanged and pipes the upstream byte stream straight back without
//! buffering, preserving the upstream status and content-type. The only
//! validation performed is reading the inbound body as text; the JSON shape
//! is the backend's contract, not ours.
//!
//! There is deliberately no idle timeout on the stream: "thinking" can
//! legitimately take tens of seconds. A stalled upstream therefore holds
//! the connection open; known resource-exhaustion risk under load.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::counter;
use serde_json::json;
use tracing::warn;

use crate::api::AppState;

/// Inbound bodies beyond this are not chat prompts; matches the backend cap.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const DEFAULT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

pub async fn relay_chat(State(state): State<AppState>, req: Request) -> Response {
    // Fail fast when the body cannot be read as text; the only 400 in the
    // system for malformed input.
    let body_text = match read_body_text(req).await {
        Some(t) => t,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({"ok": false, "error": "invalid request body"})),
            )
                .into_response();
        }
    };
    counter!("relay_requests_total").increment(1);

    let upstream = state
        .http
        .post(format!("{}/api/ai/chat", state.cfg.backend_base_url))
        .header(header::ACCEPT, "text/event-stream,application/json")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body_text)
        .send()
        .await;

    let upstream = match upstream {
        Ok(r) => r,
        Err(e) => {
            warn!(error = ?e, "chat relay upstream unreachable");
            counter!("relay_upstream_errors_total").increment(1);
            return (
                StatusCode::BAD_GATEWAY,
                axum::Json(json!({"ok": false, "error": "backend_unreachable"})),
            )
                .into_response();
        }
    };

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_STREAM_CONTENT_TYPE)
        .to_string();

    // Pipe the upstream body through unbuffered; force headers that keep
    // proxies from caching or coalescing the event stream.
    let mut resp = Response::new(Body::from_stream(upstream.bytes_stream()));
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    if let Ok(ct) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, ct);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    resp
}

async fn read_body_text(req: Request) -> Option<String> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}
