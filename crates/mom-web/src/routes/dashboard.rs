//! Dashboard route handler.
//!
//! Serves the embedded single-page scan dashboard.

use axum::response::{Html, IntoResponse};
use axum::Json;
use serde_json::json;

const DASHBOARD_HTML: &str = include_str!("../../assets/index.html");

/// GET / - Serve the scan dashboard.
pub async fn index() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

/// GET /api/health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
