//! Per-request timing and tagging
//!
//! The recorder is framework-agnostic: the HTTP layer captures what it needs
//! into a [`CompletedRequest`] after the downstream handler returns and hands
//! it to [`RequestStatsRecorder::record`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::StatsConfig;
use crate::error::SinkError;
use crate::sample::{Fields, MetricSample, RequestTime, Tags};
use crate::sink::MetricsSink;

/// Tag value used when a mirrored header is absent from the request.
pub const HEADER_NOT_SET: &str = "not_set";

/// Everything the recorder needs to know about a finished request.
#[derive(Debug, Clone)]
pub struct CompletedRequest {
    pub method: String,
    /// Full request URI (path and query), used in the slow-request log.
    pub uri: String,
    /// Raw request path, normalized before tagging.
    pub path: String,
    pub status: u16,
    pub elapsed: Duration,
    /// Captured values of configured headers, keyed by lower-cased name.
    pub headers: Vec<(String, String)>,
}

impl CompletedRequest {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        elapsed: Duration,
    ) -> Self {
        let path = path.into();
        Self {
            method: method.into(),
            uri: path.clone(),
            path,
            status,
            elapsed,
            headers: Vec::new(),
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Measures requests and emits one [`MetricSample`] per request.
pub struct RequestStatsRecorder {
    config: StatsConfig,
    sink: Arc<dyn MetricsSink>,
}

impl RequestStatsRecorder {
    pub fn new(config: StatsConfig, sink: Arc<dyn MetricsSink>) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Whether a request header should be captured for tagging.
    pub fn captures_header(&self, name: &str) -> bool {
        self.config
            .add_headers()
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }

    /// Tags for `request`: status, method, app, normalized path and one
    /// `header_<name>` tag per configured header.
    pub fn build_tags(&self, request: &CompletedRequest) -> Tags {
        let mut tags = Tags::new();
        tags.insert("status".to_string(), request.status.to_string());
        tags.insert("method".to_string(), request.method.clone());
        tags.insert("app".to_string(), self.config.app_name().to_string());
        tags.insert("path".to_string(), self.config.clean_path(&request.path));

        for name in self.config.add_headers() {
            let value = request.header(name).unwrap_or(HEADER_NOT_SET);
            tags.insert(format!("header_{}", name), value.to_string());
        }

        tags
    }

    pub fn sample(&self, request: &CompletedRequest) -> MetricSample {
        MetricSample {
            name: self.config.metric_name().to_string(),
            fields: Fields::single(request.elapsed),
            tags: self.build_tags(request),
        }
    }

    /// Emit the sample and the slow-request log for `request`.
    ///
    /// Sink failures are logged and swallowed; this never fails the request.
    pub fn record(&self, request: &CompletedRequest) {
        if let Err(e) = self.write_stats(request) {
            tracing::error!("Could not write stats: {}", e);
        }
    }

    fn write_stats(&self, request: &CompletedRequest) -> Result<(), SinkError> {
        let sample = self.sample(request);
        self.sink.write(&sample)?;

        if self.config.is_long_request(request.elapsed) {
            tracing::warn!(
                "Long request, took {}: {} {}",
                RequestTime::from(request.elapsed),
                request.method,
                request.uri
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Default)]
    struct MemorySink {
        samples: Mutex<Vec<MetricSample>>,
    }

    impl MetricsSink for MemorySink {
        fn write(&self, sample: &MetricSample) -> Result<(), SinkError> {
            self.samples.lock().unwrap().push(sample.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl MetricsSink for FailingSink {
        fn write(&self, _sample: &MetricSample) -> Result<(), SinkError> {
            Err(SinkError::Other("connection refused".to_string()))
        }
    }

    /// Collects (level, message) of every event.
    #[derive(Clone, Default)]
    struct CaptureLayer {
        events: Arc<Mutex<Vec<(Level, String)>>>,
    }

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.events
                .lock()
                .unwrap()
                .push((*event.metadata().level(), visitor.0));
        }
    }

    fn capture_logs<F: FnOnce()>(f: F) -> Vec<(Level, String)> {
        let layer = CaptureLayer::default();
        let events = layer.events.clone();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        events.lock().unwrap().clone()
    }

    fn recorder_with(config: StatsConfig) -> (RequestStatsRecorder, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (RequestStatsRecorder::new(config, sink.clone()), sink)
    }

    #[test]
    fn test_emits_one_sample_with_default_tags() {
        let (recorder, sink) = recorder_with(StatsConfig::default().with_app_name("YourApp"));
        let request =
            CompletedRequest::new("GET", "/users/1234567/profile", 400, Duration::from_micros(24_760));

        recorder.record(&request);

        let samples = sink.samples.lock().unwrap();
        assert_eq!(samples.len(), 1);
        let sample = &samples[0];
        assert_eq!(sample.name, "http_request");
        assert_eq!(sample.fields.hit, 1);
        assert_eq!(sample.fields.request_time, RequestTime(0.02476));
        assert_eq!(sample.tags.len(), 4);
        assert_eq!(sample.tags["status"], "400");
        assert_eq!(sample.tags["method"], "GET");
        assert_eq!(sample.tags["app"], "YourApp");
        assert_eq!(sample.tags["path"], "/users/:int/profile");
    }

    #[test]
    fn test_header_tags() {
        let (recorder, _) =
            recorder_with(StatsConfig::default().with_add_headers(["X-Client-Version", "X-Tenant"]));
        let request = CompletedRequest::new("POST", "/login", 200, Duration::from_millis(3))
            .with_header("X-Client-Version", "2.1.0");

        let tags = recorder.build_tags(&request);

        assert_eq!(tags["header_x-client-version"], "2.1.0");
        assert_eq!(tags["header_x-tenant"], HEADER_NOT_SET);
        assert!(recorder.captures_header("x-tenant"));
        assert!(!recorder.captures_header("authorization"));
    }

    #[test]
    fn test_custom_metric_name_and_raw_path() {
        let (recorder, _) = recorder_with(
            StatsConfig::default()
                .with_metric_name("api_call")
                .without_path_cleanups(),
        );
        let sample = recorder.sample(&CompletedRequest::new(
            "GET",
            "/Users/1234567",
            200,
            Duration::from_millis(1),
        ));

        assert_eq!(sample.name, "api_call");
        assert_eq!(sample.tags["path"], "/Users/1234567");
    }

    #[test]
    fn test_long_request_logs_warning() {
        let (recorder, _) = recorder_with(StatsConfig::default());
        let request = CompletedRequest::new("GET", "/reports", 200, Duration::from_millis(23_042))
            .with_uri("/reports?year=2024");

        let logs = capture_logs(|| recorder.record(&request));

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, Level::WARN);
        assert_eq!(logs[0].1, "Long request, took 23.042: GET /reports?year=2024");
    }

    #[test]
    fn test_fast_request_logs_nothing() {
        let (recorder, _) = recorder_with(StatsConfig::default());
        let request = CompletedRequest::new("GET", "/reports", 200, Duration::from_secs(2));

        let logs = capture_logs(|| recorder.record(&request));

        assert!(logs.is_empty());
    }

    #[test]
    fn test_zero_threshold_disables_long_request_log() {
        let (recorder, sink) =
            recorder_with(StatsConfig::default().with_long_request_threshold(Duration::ZERO));
        let request = CompletedRequest::new("GET", "/reports", 200, Duration::from_secs(60));

        let logs = capture_logs(|| recorder.record(&request));

        assert!(logs.is_empty());
        assert_eq!(sink.samples.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_sink_failure_is_logged_once() {
        let recorder = RequestStatsRecorder::new(StatsConfig::default(), Arc::new(FailingSink));
        let request = CompletedRequest::new("GET", "/slow", 200, Duration::from_secs(30));

        let logs = capture_logs(|| recorder.record(&request));

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, Level::ERROR);
        assert_eq!(logs[0].1, "Could not write stats: connection refused");
    }
}
