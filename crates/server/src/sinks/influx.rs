//! InfluxDB line protocol sink
//!
//! `write` only encodes and enqueues; a background task drains the queue in
//! batches and POSTs them to the InfluxDB `/write` endpoint. A full queue
//! drops the sample and reports [`SinkError::Full`] so request handling never
//! waits on the metrics backend.
//!
//! Delivery runs after `write` has returned, so a failed or rejected POST is
//! outside the recorder's error handling. Those failures are logged here at
//! warn level and the batch is dropped.

use reqstats_core::{MetricSample, MetricsSink, SinkError};
use reqwest::Url;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Maximum number of lines sent in one request.
const MAX_BATCH: usize = 500;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Sink that ships samples to InfluxDB over HTTP
#[derive(Clone)]
pub struct InfluxSink {
    tx: mpsc::Sender<String>,
}

impl InfluxSink {
    /// Create the sink and spawn its delivery task on the current runtime.
    pub fn spawn(write_url: Url, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        tokio::spawn(deliver(reqwest::Client::new(), write_url, rx));
        Self { tx }
    }

    /// Create a sink backed by an existing queue. The caller owns delivery.
    pub fn with_queue(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl MetricsSink for InfluxSink {
    fn write(&self, sample: &MetricSample) -> Result<(), SinkError> {
        self.tx.try_send(line_protocol(sample)).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

/// Drain queued lines and POST them in batches until every sender is gone.
async fn deliver(client: reqwest::Client, write_url: Url, mut rx: mpsc::Receiver<String>) {
    let mut batch = Vec::with_capacity(MAX_BATCH);

    while rx.recv_many(&mut batch, MAX_BATCH).await > 0 {
        let body = batch.join("\n");
        let lines = batch.len();
        batch.clear();

        match client.post(write_url.clone()).body(body).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    status = %response.status(),
                    lines,
                    "InfluxDB rejected metrics batch"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, lines, "Failed to deliver metrics batch");
            }
        }
    }

    tracing::debug!("InfluxDB sink queue closed");
}

/// Encode one sample as a line protocol record (no timestamp; the server
/// assigns receive time).
///
/// Line protocol has no empty tag values, so tags with an empty value are
/// left out of the record.
pub fn line_protocol(sample: &MetricSample) -> String {
    let mut line = escape(&sample.name, &[',', ' ']);

    for (key, value) in sample.tags.iter().filter(|(_, value)| !value.is_empty()) {
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    line.push_str(&format!(
        " hit={}i,request_time={}",
        sample.fields.hit, sample.fields.request_time
    ));
    line
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
