use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

// Liveness probe for the hosting platform. No database round-trip.
async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}
