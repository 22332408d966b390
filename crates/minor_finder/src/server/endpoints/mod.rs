pub mod catalog;
pub mod recommendations;
pub mod status;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::catalog::CatalogError;
use crate::server::types::ApiErrorType;

/// Maps a catalog failure to 502: the upstream catalog, not this server, is
/// at fault.
pub(crate) fn catalog_error_to_response(error: &CatalogError) -> Response {
    ApiErrorType::from((
        StatusCode::BAD_GATEWAY,
        "Failed to read the course catalog",
        Some(error.to_string()),
    ))
    .into_response()
}
