//! Liveness endpoint for the commerce API.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — liveness only; no store or gateway checks.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
