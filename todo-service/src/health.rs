//! Health check handler

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Status reported while the process is serving
pub const HEALTHY: &str = "Healthy";

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
}

/// Liveness probe
///
/// Answers as long as the process can serve HTTP; it does not touch the
/// store.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: HEALTHY.to_string(),
        }),
    )
}
