use thiserror::Error;

/// Failure while handing a sample to a metrics sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink queue is full, sample dropped")]
    Full,

    #[error("sink is closed")]
    Closed,

    #[error("failed to encode sample: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
