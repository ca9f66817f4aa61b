//! reqstats-core: request timing and path normalization
//!
//! This crate holds everything that does not depend on an HTTP framework:
//! the path normalizer, the metric sample types, the sink seam and the
//! recorder that ties them together.

pub mod config;
pub mod error;
pub mod normalize;
pub mod recorder;
pub mod sample;
pub mod sink;

pub use config::{PathCleanup, StatsConfig};
pub use error::SinkError;
pub use normalize::{PathNormalizer, Rule, replace_idish};
pub use recorder::{CompletedRequest, HEADER_NOT_SET, RequestStatsRecorder};
pub use sample::{Fields, MetricSample, RequestTime, Tags};
pub use sink::MetricsSink;
