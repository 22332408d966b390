//! Catalog browsing and cache management endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info};

use super::catalog_error_to_response;
use crate::catalog::CatalogSource;
use crate::types::AppState;

/// GET /minors
///
/// Every minor in catalog order, as `{name, link}` objects.
pub async fn get_minors(State(s): State<Arc<AppState>>) -> Response {
    match s.catalog.list_minors().await {
        Ok(minors) => (StatusCode::OK, Json(minors)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list minors");
            catalog_error_to_response(&e)
        }
    }
}

/// GET /majors
///
/// Sorted major names, used to pick the student's current major.
pub async fn get_majors(State(s): State<Arc<AppState>>) -> Response {
    match s.catalog.list_majors().await {
        Ok(majors) => (StatusCode::OK, Json(majors)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list majors");
            catalog_error_to_response(&e)
        }
    }
}

/// GET /catalog/cache_stats
pub async fn get_cache_stats(State(s): State<Arc<AppState>>) -> Response {
    (StatusCode::OK, Json(s.catalog.stats())).into_response()
}

/// POST /catalog/invalidate_cache
pub async fn invalidate_cache(State(s): State<Arc<AppState>>) -> Response {
    info!("POST /catalog/invalidate_cache");
    s.catalog.clear();
    (StatusCode::OK, Json(json!({ "message": "Cache invalidated" }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBackend, StaticCatalog};
    use crate::config::AppConfig;

    fn state() -> Arc<AppState> {
        let catalog = StaticCatalog::from_json(
            r#"{"minors": [{"name": "Art Minor", "link": "https://catalog.example.edu/art"}],
                "majors": ["History", "Art"]}"#,
        )
        .unwrap();
        Arc::new(AppState::new(
            CatalogBackend::Snapshot(catalog),
            AppConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_cache_stats_and_invalidate() {
        let s = state();
        let response = get_minors(State(s.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = get_majors(State(s.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(s.catalog.stats().active_entries, 2);

        let response = invalidate_cache(State(s.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(s.catalog.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_majors_are_sorted() {
        let response = get_majors(State(state())).await;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let majors: Vec<String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(majors, vec!["Art".to_string(), "History".to_string()]);
    }
}
