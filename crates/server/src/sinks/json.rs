//! Newline-delimited JSON sink
//!
//! Writes one object per sample, e.g.
//! `{"name":"http_request","fields":{"hit":1,"request_time":0.02476},"tags":{..}}`.
//! Useful for local runs and for shipping through a log pipeline.

use std::io::{self, Write};
use std::sync::Mutex;

use reqstats_core::{MetricSample, MetricsSink, SinkError, Tags};
use serde::Serialize;
use serde_json::value::RawValue;

#[derive(Serialize)]
struct JsonLine<'a> {
    name: &'a str,
    fields: JsonFields,
    tags: &'a Tags,
}

#[derive(Serialize)]
struct JsonFields {
    hit: u64,
    /// Emitted verbatim so small values keep their fixed-precision rendering
    /// instead of serde_json's exponent form.
    request_time: Box<RawValue>,
}

/// Sink writing JSON lines to any `Write`
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn encode(sample: &MetricSample) -> Result<Vec<u8>, SinkError> {
    let request_time = RawValue::from_string(sample.fields.request_time.to_string())
        .map_err(|e| SinkError::Encode(e.to_string()))?;

    let line = JsonLine {
        name: &sample.name,
        fields: JsonFields {
            hit: sample.fields.hit,
            request_time,
        },
        tags: &sample.tags,
    };

    let mut buf = serde_json::to_vec(&line).map_err(|e| SinkError::Encode(e.to_string()))?;
    buf.push(b'\n');
    Ok(buf)
}

impl<W: Write + Send> MetricsSink for JsonLinesSink<W> {
    fn write(&self, sample: &MetricSample) -> Result<(), SinkError> {
        let buf = encode(sample)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| SinkError::Other("JSON sink writer lock poisoned".to_string()))?;
        out.write_all(&buf)?;
        out.flush()?;
        Ok(())
    }
}
