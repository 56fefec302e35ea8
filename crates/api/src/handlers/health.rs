//! Liveness and info endpoints. No auth required.

use axum::Json;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service info")
    )
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Medical Wallet API (CKD MVP)" }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response")
    )
)]
/// Health check endpoint for uptime monitoring and orchestration.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
