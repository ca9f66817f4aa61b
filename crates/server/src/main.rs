//! reqstats-server: binary entrypoint.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reqstats_server::config::{Config, SinkKind};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Log startup info
    match &config.sink {
        SinkKind::Prometheus => tracing::info!("Metrics sink: prometheus (GET /metrics)"),
        SinkKind::Influx { write_url, .. } => {
            tracing::info!("Metrics sink: influx ({})", write_url)
        }
        SinkKind::Json => tracing::info!("Metrics sink: json lines on stdout"),
    }
    if config.path_cleanups.is_empty() {
        tracing::warn!("Path normalization disabled, metrics are tagged with raw paths");
    }
    if config.long_request_threshold.is_zero() {
        tracing::info!("Long request logging disabled");
    } else {
        tracing::info!(
            "Logging requests slower than {}s",
            config.long_request_threshold.as_secs_f64()
        );
    }

    // Build application
    let app = reqstats_server::build_app(&config);

    // Start server
    let addr = config.bind_address;
    tracing::info!("Starting reqstats server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    tracing::info!("Server shutdown complete");
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
