//! Sink that writes through the `metrics` facade
//!
//! Each sample becomes a counter increment and a histogram observation, with
//! the sample's tags as labels. The Prometheus exporter renders them on
//! `/metrics`.

use metrics::Label;
use reqstats_core::{MetricSample, MetricsSink, SinkError};

#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl PrometheusSink {
    pub fn new() -> Self {
        Self
    }
}

fn labels(sample: &MetricSample) -> Vec<Label> {
    sample
        .tags
        .iter()
        .map(|(key, value)| Label::new(key.clone(), value.clone()))
        .collect()
}

impl MetricsSink for PrometheusSink {
    fn write(&self, sample: &MetricSample) -> Result<(), SinkError> {
        metrics::counter!(format!("{}_hit_total", sample.name), labels(sample))
            .increment(sample.fields.hit);

        metrics::histogram!(
            format!("{}_request_time_seconds", sample.name),
            labels(sample)
        )
        .record(sample.fields.request_time.as_secs_f64());

        Ok(())
    }
}
