//! Outbound seam to the metrics backend

use std::sync::Arc;

use crate::error::SinkError;
use crate::sample::MetricSample;

/// Destination for metric samples.
///
/// The recorder calls `write` once per request from whatever task served it,
/// so implementations must tolerate concurrent writers.
pub trait MetricsSink: Send + Sync {
    fn write(&self, sample: &MetricSample) -> Result<(), SinkError>;
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn write(&self, sample: &MetricSample) -> Result<(), SinkError> {
        (**self).write(sample)
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for Box<T> {
    fn write(&self, sample: &MetricSample) -> Result<(), SinkError> {
        (**self).write(sample)
    }
}
