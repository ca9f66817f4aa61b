//! reqstats-server library crate
//!
//! Exposes the request statistics middleware, the metrics sinks and
//! `build_app` for integration tests. The binary entrypoint is in `main.rs`.

pub mod config;
pub mod error;
pub mod middleware;
mod routes;
pub mod sinks;

use std::sync::{Arc, OnceLock};

use axum::{Extension, Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reqstats_core::{MetricsSink, RequestStatsRecorder};
use tower_http::trace::TraceLayer;

use config::Config;

/// Handle of the global Prometheus recorder, installed on first use.
///
/// Repeated calls (e.g. one app per integration test) share the same live
/// recorder instead of installing a second one.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!(
                    "Another global metrics recorder is installed, /metrics will be empty"
                );
            }
            handle
        })
        .clone()
}

/// Build the full application router with the sink selected in `config`.
///
/// Must be called inside a Tokio runtime (the Influx sink spawns a task).
pub fn build_app(config: &Config) -> Router {
    let sink = sinks::from_config(&config.sink);
    build_app_with_sink(config, sink)
}

/// Build the application router writing samples to `sink`.
pub fn build_app_with_sink(config: &Config, sink: Arc<dyn MetricsSink>) -> Router {
    let recorder = Arc::new(RequestStatsRecorder::new(config.stats_config(), sink));
    let handle = prometheus_handle();

    let app = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .fallback(routes::not_found)
        .layer(Extension(handle));

    middleware::instrument(app, recorder).layer(TraceLayer::new_for_http())
}
