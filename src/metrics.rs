// src/metrics.rs
//! Prometheus wiring: recorder install, portal series registration, and
//! the `/metrics` route.
//!
//! All series the portal emits are described here in one place, so every
//! scrape carries help text regardless of which code path fired first.

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::fetcher::FETCH_TIMEOUT;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and register the portal's series.
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_series();

        // Static gauge so dashboards can annotate fetch-failure spikes
        // against the configured timeout.
        gauge!("fetch_timeout_ms").set(FETCH_TIMEOUT.as_millis() as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_series() {
    // Feed normalization.
    describe_counter!("feed_items_total", "Raw wire items entering normalization.");
    describe_counter!(
        "feed_dropped_total",
        "Items dropped as boilerplate, broken-script, or wrong-locale."
    );
    describe_counter!("feed_dedup_total", "Items removed as canonical-URL duplicates.");
    describe_histogram!("feed_normalize_ms", "Normalization pass time in milliseconds.");

    // Page fetcher.
    describe_counter!(
        "fetch_failures_total",
        "Page-data fetches that degraded to an empty result."
    );

    // Chat relay.
    describe_counter!("relay_requests_total", "Chat relay requests accepted.");
    describe_counter!(
        "relay_upstream_errors_total",
        "Chat relay upstream connection failures."
    );
}
