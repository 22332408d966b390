//! Progress evaluation, ranking and presentation of minor results.
mod evaluator;
mod format;
mod recommend;
mod residency;
mod schedule;
mod types;

pub use evaluator::ProgressEvaluator;
pub use format::{clean_title, format_code, render_minor, render_section};
pub use recommend::{
    compute_recommendations, fetch_catalog, rank_minors, MinorReport, RecommendError,
    RecommendationReport, RecommendationRequest, Recommendations, NO_MATCHES_MESSAGE, SEMESTERS,
};
pub use residency::{residency_for, residency_percent};
pub use schedule::{plan_remaining, SemesterPlan};
pub use types::*;
