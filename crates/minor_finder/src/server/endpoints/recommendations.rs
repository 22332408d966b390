//! The recommendation endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::catalog_error_to_response;
use crate::progress::{
    compute_recommendations, RecommendError, RecommendationReport, RecommendationRequest,
};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationParams {
    /// Attach a semester-by-semester plan of remaining courses
    #[serde(default)]
    pub plan: bool,
}

/// POST /recommendations
///
/// Body is a [`RecommendationRequest`]. Invalid course codes, a missing
/// course list or a semester outside 1..=8 are rejected with 400; a catalog
/// failure is a 502.
pub async fn post_recommendations(
    State(s): State<Arc<AppState>>,
    Query(params): Query<RecommendationParams>,
    body: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected recommendation request");
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "Invalid recommendation request",
                Some(rejection.body_text()),
            ))
            .into_response();
        }
    };

    let correlation_id = generate_correlation_id();
    let start = Instant::now();
    info!(
        correlation_id = %correlation_id,
        courses = request.courses.len(),
        major = ?request.current_major,
        "POST /recommendations"
    );

    let outcome = compute_recommendations(
        &s.catalog,
        &request,
        s.config.catalog.fetch_concurrency,
    )
    .await;

    match outcome {
        Ok(recommendations) => {
            let per_semester = params.plan.then_some(s.config.schedule.per_semester);
            let report = RecommendationReport::build(
                &recommendations,
                request.current_semester,
                per_semester,
            );
            info!(
                correlation_id = %correlation_id,
                matches = report.minors.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Recommendations computed"
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e @ (RecommendError::NeedInput | RecommendError::InvalidSemester(_))) => {
            ApiErrorType::from((StatusCode::BAD_REQUEST, e.to_string().as_str(), None))
                .into_response()
        }
        Err(RecommendError::Catalog(e)) => {
            error!(
                correlation_id = %correlation_id,
                error = %e,
                retryable = e.is_retryable(),
                "Failed to compute recommendations"
            );
            catalog_error_to_response(&e)
        }
    }
}

/// Short id tying together the log lines of one request.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBackend, CatalogEntry, StaticCatalog};
    use crate::config::AppConfig;
    use crate::requirements::{CourseCode, MinorListing, MinorRequirements, RawItems};
    use serde_json::Value;

    fn state() -> Arc<AppState> {
        let entry = CatalogEntry {
            listing: MinorListing {
                name: "Mathematics Minor".to_string(),
                link: "https://catalog.example.edu/math".to_string(),
            },
            requirements: MinorRequirements {
                sections: [(
                    "A. Required Courses".to_string(),
                    RawItems::Flat(vec![
                        "MA16100".to_string(),
                        "MA16200".to_string(),
                        "MA26100".to_string(),
                    ]),
                )]
                .into_iter()
                .collect(),
                notes: vec![],
            },
        };
        let backend = CatalogBackend::Snapshot(StaticCatalog::new(vec![entry], vec![]));
        Arc::new(AppState::new(backend, AppConfig::default()))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(codes: &[&str]) -> RecommendationRequest {
        let taken: Vec<CourseCode> = codes.iter().map(|c| c.parse().unwrap()).collect();
        RecommendationRequest::from_codes(taken, vec![], 2)
    }

    #[tokio::test]
    async fn test_ranked_with_plan() {
        let response = post_recommendations(
            State(state()),
            Query(RecommendationParams { plan: true }),
            Ok(Json(request(&["MA16100"]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ranked");
        assert_eq!(body["minors"][0]["name"], "Mathematics Minor");
        assert_eq!(body["minors"][0]["plan"][0]["semester"], 3);
        assert_eq!(
            body["minors"][0]["plan"][0]["courses"],
            serde_json::json!(["MA16200", "MA26100"])
        );
    }

    #[tokio::test]
    async fn test_no_matches_is_ok() {
        let response = post_recommendations(
            State(state()),
            Query(RecommendationParams::default()),
            Ok(Json(request(&["CS18000"]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "no_matches");
        assert_eq!(body["message"], "No minors found with requirements.");
    }

    #[tokio::test]
    async fn test_empty_courses_is_bad_request() {
        let response = post_recommendations(
            State(state()),
            Query(RecommendationParams::default()),
            Ok(Json(RecommendationRequest::default())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Add at least one course to proceed.");
    }

    #[tokio::test]
    async fn test_semester_out_of_range_is_bad_request() {
        let mut req = request(&["MA16100"]);
        req.current_semester = u32::MAX;
        let response = post_recommendations(
            State(state()),
            Query(RecommendationParams { plan: true }),
            Ok(Json(req)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["message"],
            "Semester must be between 1 and 8, got 4294967295"
        );
    }

    #[test]
    fn test_correlation_id_shape() {
        let id = generate_correlation_id();
        let (_, random) = id.split_once('-').unwrap();
        assert_eq!(random.len(), 8);
    }
}
