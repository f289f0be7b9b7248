// src/metrics.rs
//! Metric names, one-time descriptions and the optional Prometheus exporter.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

pub const COLLECT_ARTICLES_TOTAL: &str = "collect_articles_total";
pub const COLLECT_PROVIDER_ERRORS_TOTAL: &str = "collect_provider_errors_total";
pub const DEDUP_REMOVED_TOTAL: &str = "dedup_removed_total";
pub const PIPELINE_RUNS_TOTAL: &str = "pipeline_runs_total";
pub const PIPELINE_DURATION_MS: &str = "pipeline_duration_ms";
pub const PIPELINE_LAST_RUN_TS: &str = "pipeline_last_run_ts";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(COLLECT_ARTICLES_TOTAL, "Articles returned by collectors.");
        describe_counter!(
            COLLECT_PROVIDER_ERRORS_TOTAL,
            "Collector failures (the run continues without that collector)."
        );
        describe_counter!(DEDUP_REMOVED_TOTAL, "Articles removed by deduplication, by pass.");
        describe_counter!(PIPELINE_RUNS_TOTAL, "Collection runs, by outcome.");
        describe_histogram!(PIPELINE_DURATION_MS, "Collection run duration in milliseconds.");
        describe_gauge!(PIPELINE_LAST_RUN_TS, "Unix ts when the collection last finished.");
    });
}

/// Install the Prometheus recorder with an HTTP listener serving `/metrics` on `addr`.
/// Must be called inside a tokio runtime.
pub fn install_prometheus(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("installing prometheus exporter on {addr}"))?;
    ensure_described();
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}
