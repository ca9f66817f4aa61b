//! HTTP middleware

pub mod request_stats;

pub use request_stats::{instrument, request_stats_middleware};
