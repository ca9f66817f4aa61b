//! Metric sample emitted once per completed request

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Tag set attached to a sample. Names are unique by construction.
pub type Tags = BTreeMap<String, String>;

/// Below this many seconds the elapsed time is rendered with fixed precision.
const FIXED_PRECISION_BELOW: f64 = 0.0001;

/// Elapsed request time in seconds.
///
/// `Display` never produces scientific notation: values under 0.0001s are
/// rendered with five decimals, everything else with the shortest
/// representation that round-trips.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RequestTime(pub f64);

impl RequestTime {
    pub fn as_secs_f64(self) -> f64 {
        self.0
    }
}

impl From<Duration> for RequestTime {
    fn from(elapsed: Duration) -> Self {
        Self(elapsed.as_secs_f64())
    }
}

impl fmt::Display for RequestTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < FIXED_PRECISION_BELOW {
            write!(f, "{:.5}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Numeric fields of a request sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fields {
    pub hit: u64,
    pub request_time: RequestTime,
}

impl Fields {
    /// Fields for a single request that took `elapsed`.
    pub fn single(elapsed: Duration) -> Self {
        Self {
            hit: 1,
            request_time: elapsed.into(),
        }
    }
}

/// One emission: metric name, numeric fields and tags
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub fields: Fields,
    pub tags: Tags,
}
