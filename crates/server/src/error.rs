//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Error returned by the host application's own handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: invalid number {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: threshold must be a finite, non-negative number of seconds, got {value:?}")]
    InvalidThreshold { var: &'static str, value: String },

    #[error("{var}: invalid socket address {value:?}: {reason}")]
    InvalidAddress {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var}: unknown path cleanup {name:?} (expected \"idish\" or \"none\")")]
    UnknownPathCleanup { var: &'static str, name: String },

    #[error("{var}: unknown sink {name:?} (expected \"prometheus\", \"influx\" or \"json\")")]
    UnknownSink { var: &'static str, name: String },

    #[error("{var} is required when STATS_SINK=influx")]
    Missing { var: &'static str },

    #[error("{var}: invalid URL {value:?}: {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
}
