//! Health check endpoint

use axum::{Json, response::IntoResponse};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// GET /health - Liveness probe
pub async fn check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}
