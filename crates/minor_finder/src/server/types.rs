use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiErrorType {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, message, details): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: message.to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
