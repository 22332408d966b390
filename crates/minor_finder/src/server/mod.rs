use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::server::endpoints::{catalog, recommendations, status};
use crate::types::AppState;

mod endpoints;
mod types;

pub use types::ApiErrorType;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let catalog_router = Router::new()
        .route("/catalog/cache_stats", get(catalog::get_cache_stats))
        .route("/catalog/invalidate_cache", post(catalog::invalidate_cache));

    Router::new()
        .route("/health", get(status::get_health))
        .route("/minors", get(catalog::get_minors))
        .route("/majors", get(catalog::get_majors))
        .route(
            "/recommendations",
            post(recommendations::post_recommendations),
        )
        .merge(catalog_router)
        .with_state(app_state)
}
