// src/metrics.rs
use anyhow::Context;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use shuttle_axum::axum::{routing::get, Router};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Call once, from the binary.
    pub fn init() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!(
            "job_match_results_total",
            "Match results returned, labeled by producing strategy"
        );
        describe_counter!(
            "job_match_fallbacks_total",
            "Matcher failures that continued down the fallback chain"
        );
        describe_counter!(
            "local_model_health_checks_total",
            "Local model health probes by outcome"
        );
        describe_histogram!("job_match_duration_ms", "End-to-end match latency in ms");

        Ok(Self { handle })
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
