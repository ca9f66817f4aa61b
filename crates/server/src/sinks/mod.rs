//! Metrics sink implementations

pub mod influx;
pub mod json;
pub mod prometheus;

pub use influx::InfluxSink;
pub use json::JsonLinesSink;
pub use prometheus::PrometheusSink;

use std::sync::Arc;

use reqstats_core::MetricsSink;

use crate::config::SinkKind;

/// Build the sink selected in configuration.
///
/// The Influx sink spawns its delivery task, so this must run inside a Tokio
/// runtime.
pub fn from_config(kind: &SinkKind) -> Arc<dyn MetricsSink> {
    match kind {
        SinkKind::Prometheus => Arc::new(PrometheusSink::new()),
        SinkKind::Influx {
            write_url,
            queue_capacity,
        } => Arc::new(InfluxSink::spawn(write_url.clone(), *queue_capacity)),
        SinkKind::Json => Arc::new(JsonLinesSink::stdout()),
    }
}
