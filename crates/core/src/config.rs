//! Recorder configuration
//!
//! Built once at startup and never mutated afterwards; the recorder only holds
//! a shared reference, so concurrent requests read it without locking.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::normalize::replace_idish;

/// A single path cleanup step in the normalization chain.
pub type PathCleanup = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub const DEFAULT_APP_NAME: &str = "unknown";
pub const DEFAULT_METRIC_NAME: &str = "http_request";
pub const DEFAULT_LONG_REQUEST_THRESHOLD: Duration = Duration::from_secs(5);

/// Immutable settings for [`RequestStatsRecorder`](crate::RequestStatsRecorder)
#[derive(Clone)]
pub struct StatsConfig {
    app_name: String,
    metric_name: String,
    path_cleanups: Vec<PathCleanup>,
    add_headers: Vec<String>,
    long_request_threshold: Duration,
}

impl StatsConfig {
    /// Defaults: app `unknown`, metric `http_request`, the built-in path
    /// normalizer, no mirrored headers and a 5 second slow-request threshold.
    pub fn new() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            path_cleanups: vec![Arc::new(replace_idish) as PathCleanup],
            add_headers: Vec::new(),
            long_request_threshold: DEFAULT_LONG_REQUEST_THRESHOLD,
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_metric_name(mut self, metric_name: impl Into<String>) -> Self {
        self.metric_name = metric_name.into();
        self
    }

    /// Replace the cleanup chain. An empty list disables normalization.
    pub fn with_path_cleanups(mut self, cleanups: Vec<PathCleanup>) -> Self {
        self.path_cleanups = cleanups;
        self
    }

    /// Append one cleanup step to the end of the chain.
    pub fn with_path_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.path_cleanups.push(Arc::new(cleanup));
        self
    }

    /// Tag metrics with the raw request path.
    pub fn without_path_cleanups(self) -> Self {
        self.with_path_cleanups(Vec::new())
    }

    /// Request headers mirrored into `header_<name>` tags.
    pub fn with_add_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_headers = Vec::new();
        for name in headers {
            let name = name.into().to_ascii_lowercase();
            if !name.is_empty() && !self.add_headers.contains(&name) {
                self.add_headers.push(name);
            }
        }
        self
    }

    /// Requests slower than this are logged. Zero disables the log.
    pub fn with_long_request_threshold(mut self, threshold: Duration) -> Self {
        self.long_request_threshold = threshold;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn path_cleanups(&self) -> &[PathCleanup] {
        &self.path_cleanups
    }

    /// Lower-cased header names, in configuration order.
    pub fn add_headers(&self) -> &[String] {
        &self.add_headers
    }

    pub fn long_request_threshold(&self) -> Duration {
        self.long_request_threshold
    }

    /// Whether `elapsed` should produce a slow-request log entry.
    pub fn is_long_request(&self, elapsed: Duration) -> bool {
        !self.long_request_threshold.is_zero() && elapsed > self.long_request_threshold
    }

    /// Run `raw` through every cleanup step in order.
    pub fn clean_path(&self, raw: &str) -> String {
        self.path_cleanups
            .iter()
            .fold(raw.to_string(), |path, cleanup| cleanup(&path))
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsConfig")
            .field("app_name", &self.app_name)
            .field("metric_name", &self.metric_name)
            .field("path_cleanups", &self.path_cleanups.len())
            .field("add_headers", &self.add_headers)
            .field("long_request_threshold", &self.long_request_threshold)
            .finish()
    }
}
