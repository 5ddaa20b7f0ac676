// src/handlers/health.rs

use axum::{Json, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
