use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::types::AppState;

/// GET /health
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "started_at": s.started_at.to_rfc3339(),
            "uptime_secs": s.uptime().as_secs(),
        })),
    )
        .into_response()
}
