//! Server configuration

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqstats_core::{PathCleanup, StatsConfig, config as stats, replace_idish};
use reqwest::Url;

use crate::error::ConfigError;
use crate::sinks::influx::DEFAULT_QUEUE_CAPACITY;

/// Where metric samples are written
#[derive(Debug, Clone, PartialEq)]
pub enum SinkKind {
    /// `metrics` facade, scraped from `/metrics`
    Prometheus,
    /// InfluxDB line protocol over HTTP
    Influx { write_url: Url, queue_capacity: usize },
    /// JSON lines on stdout
    Json,
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub app_name: String,
    pub metric_name: String,
    pub add_headers: Vec<String>,
    pub long_request_threshold: Duration,
    /// Names of path cleanup steps, in order. Empty disables normalization.
    pub path_cleanups: Vec<String>,
    pub sink: SinkKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            app_name: stats::DEFAULT_APP_NAME.to_string(),
            metric_name: stats::DEFAULT_METRIC_NAME.to_string(),
            add_headers: Vec::new(),
            long_request_threshold: stats::DEFAULT_LONG_REQUEST_THRESHOLD,
            path_cleanups: vec![IDISH.to_string()],
            sink: SinkKind::Prometheus,
        }
    }
}

const IDISH: &str = "idish";

/// Resolve a named path cleanup step.
fn path_cleanup(name: &str) -> Option<PathCleanup> {
    match name {
        IDISH => Some(Arc::new(replace_idish) as PathCleanup),
        _ => None,
    }
}

/// Split a comma-separated list, dropping blanks.
fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_address = match lookup("BIND_ADDRESS") {
            Some(value) => {
                value
                    .trim()
                    .parse::<SocketAddr>()
                    .map_err(|e| ConfigError::InvalidAddress {
                        var: "BIND_ADDRESS",
                        reason: e.to_string(),
                        value,
                    })?
            }
            None => defaults.bind_address,
        };

        let long_request_threshold = match lookup("STATS_LONG_REQUEST_THRESHOLD") {
            Some(value) => {
                let var = "STATS_LONG_REQUEST_THRESHOLD";
                let secs: f64 = value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                    var,
                    value: value.clone(),
                })?;
                Duration::try_from_secs_f64(secs)
                    .map_err(|_| ConfigError::InvalidThreshold { var, value })?
            }
            None => defaults.long_request_threshold,
        };

        let path_cleanups = match lookup("STATS_PATH_CLEANUPS") {
            Some(value) => {
                let names = list(&value.to_ascii_lowercase());
                if names.iter().any(|n| n == "none") {
                    Vec::new()
                } else {
                    for name in &names {
                        if path_cleanup(name).is_none() {
                            return Err(ConfigError::UnknownPathCleanup {
                                var: "STATS_PATH_CLEANUPS",
                                name: name.clone(),
                            });
                        }
                    }
                    names
                }
            }
            None => defaults.path_cleanups,
        };

        let sink = match lookup("STATS_SINK").as_deref().map(str::trim) {
            None | Some("") | Some("prometheus") => SinkKind::Prometheus,
            Some("json") => SinkKind::Json,
            Some("influx") => {
                let var = "INFLUX_WRITE_URL";
                let value = lookup(var).ok_or(ConfigError::Missing { var })?;
                let write_url = Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
                    var,
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
                let queue_capacity = match lookup("INFLUX_QUEUE_CAPACITY") {
                    Some(value) => {
                        value
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| ConfigError::InvalidNumber {
                                var: "INFLUX_QUEUE_CAPACITY",
                                value,
                            })?
                    }
                    None => DEFAULT_QUEUE_CAPACITY,
                };
                SinkKind::Influx {
                    write_url,
                    queue_capacity,
                }
            }
            Some(other) => {
                return Err(ConfigError::UnknownSink {
                    var: "STATS_SINK",
                    name: other.to_string(),
                });
            }
        };

        Ok(Self {
            bind_address,
            app_name: lookup("STATS_APP_NAME").unwrap_or(defaults.app_name),
            metric_name: lookup("STATS_METRIC_NAME").unwrap_or(defaults.metric_name),
            add_headers: lookup("STATS_ADD_HEADERS")
                .map(|value| list(&value))
                .unwrap_or(defaults.add_headers),
            long_request_threshold,
            path_cleanups,
            sink,
        })
    }

    /// Recorder settings derived from this configuration.
    pub fn stats_config(&self) -> StatsConfig {
        StatsConfig::new()
            .with_app_name(self.app_name.clone())
            .with_metric_name(self.metric_name.clone())
            .with_path_cleanups(
                self.path_cleanups
                    .iter()
                    .filter_map(|name| path_cleanup(name))
                    .collect(),
            )
            .with_add_headers(self.add_headers.iter().cloned())
            .with_long_request_threshold(self.long_request_threshold)
    }
}
