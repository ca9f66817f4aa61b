pub mod health;
pub mod metrics;

use axum::http::Uri;

use crate::error::AppError;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
