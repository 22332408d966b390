//! End-to-end recommendation pass: fetch every minor, normalize, evaluate,
//! filter and rank.

use super::evaluator::ProgressEvaluator;
use super::schedule::{plan_remaining, SemesterPlan};
use super::types::{ExperienceFlags, MinorResult, Pending};
use crate::catalog::{CatalogEntry, CatalogError, CatalogSource};
use crate::requirements::{
    normalize, CompletedCourse, CourseCode, MinorRequirements, StudentRecord,
};
use std::collections::BTreeMap;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Semesters a student can be in.
pub const SEMESTERS: RangeInclusive<u32> = 1..=8;

/// Everything the front end supplies for one recommendation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub courses: Vec<CompletedCourse>,
    #[serde(default)]
    pub current_major: Option<String>,
    #[serde(default = "default_semester")]
    pub current_semester: u32,
    #[serde(default)]
    pub flags: ExperienceFlags,
}

fn default_semester() -> u32 {
    1
}

impl Default for RecommendationRequest {
    fn default() -> Self {
        Self {
            courses: Vec::new(),
            current_major: None,
            current_semester: default_semester(),
            flags: ExperienceFlags::default(),
        }
    }
}

impl RecommendationRequest {
    /// Rejects requests with no courses or a semester outside [`SEMESTERS`].
    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.courses.is_empty() {
            return Err(RecommendError::NeedInput);
        }
        if !SEMESTERS.contains(&self.current_semester) {
            return Err(RecommendError::InvalidSemester(self.current_semester));
        }
        Ok(())
    }

    /// Builds a request from bare codes. Courses taken here are recorded in
    /// `current_semester`; `external` codes carry no semester.
    pub fn from_codes(
        taken: impl IntoIterator<Item = CourseCode>,
        external: impl IntoIterator<Item = CourseCode>,
        current_semester: u32,
    ) -> Self {
        let semester = u8::try_from(current_semester).unwrap_or(u8::MAX);
        let courses = taken
            .into_iter()
            .map(|code| CompletedCourse::institution(code, semester))
            .chain(external.into_iter().map(CompletedCourse::external))
            .collect();
        Self {
            courses,
            current_major: None,
            current_semester,
            flags: ExperienceFlags::default(),
        }
    }
}

/// Ranked minors, or the distinct "nothing overlaps" outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendations {
    Ranked(Vec<MinorResult>),
    NoMatches,
}

impl Recommendations {
    pub fn results(&self) -> &[MinorResult] {
        match self {
            Recommendations::Ranked(results) => results,
            Recommendations::NoMatches => &[],
        }
    }
}

/// Serializable form of [`Recommendations`] handed to the front ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub minors: Vec<MinorReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinorReport {
    #[serde(flatten)]
    pub result: MinorResult,
    pub pending: BTreeMap<String, Pending>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<SemesterPlan>>,
}

impl RecommendationReport {
    /// Pass `per_semester` to attach a semester plan of remaining courses to
    /// every minor.
    pub fn build(
        recommendations: &Recommendations,
        current_semester: u32,
        per_semester: Option<usize>,
    ) -> Self {
        let minors = recommendations
            .results()
            .iter()
            .map(|result| MinorReport {
                pending: result.pending_by_section(),
                plan: per_semester.map(|n| {
                    plan_remaining(&result.remaining_codes(), current_semester, n)
                }),
                result: result.clone(),
            })
            .collect();
        match recommendations {
            Recommendations::Ranked(_) => Self {
                status: "ranked",
                message: None,
                minors,
            },
            Recommendations::NoMatches => Self {
                status: "no_matches",
                message: Some(NO_MATCHES_MESSAGE),
                minors,
            },
        }
    }
}

pub const NO_MATCHES_MESSAGE: &str = "No minors found with requirements.";

#[derive(Debug, Error)]
pub enum RecommendError {
    /// No completed courses were supplied
    #[error("Add at least one course to proceed.")]
    NeedInput,

    #[error("Semester must be between 1 and 8, got {0}")]
    InvalidSemester(u32),

    #[error("Could not list minors: {0}")]
    Catalog(#[from] CatalogError),
}

/// Fetches the minor list and every minor's requirements.
///
/// A failed requirements fetch is logged and replaced by empty requirements,
/// which later drops that minor from the results. Only a failure to list the
/// minors is returned as an error. Up to `concurrency` pages are fetched at
/// once; results keep catalog order.
pub async fn fetch_catalog<S: CatalogSource>(
    source: &S,
    concurrency: usize,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let start = Instant::now();
    let listings = source.list_minors().await?;
    info!(minors = listings.len(), "Loading minor requirements");

    let entries: Vec<CatalogEntry> = stream::iter(listings)
        .map(|listing| async move {
            let requirements = match source.get_requirements(&listing.link).await {
                Ok(requirements) => requirements,
                Err(e) => {
                    warn!(
                        minor = %listing.name,
                        url = %listing.link,
                        error = %e,
                        "Failed to load requirements, treating minor as empty"
                    );
                    MinorRequirements::default()
                }
            };
            CatalogEntry {
                listing,
                requirements,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    info!(
        minors = entries.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Loaded minor requirements"
    );
    Ok(entries)
}

/// Evaluates already-fetched minors for one request.
///
/// Drops minors with no checkable requirements or no progress, removes the
/// minor named after the student's major, and sorts by percent descending
/// (stable, so ties keep catalog order).
pub fn rank_minors(
    entries: &[CatalogEntry],
    request: &RecommendationRequest,
) -> Result<Recommendations, RecommendError> {
    request.validate()?;
    let student = StudentRecord::new(request.courses.iter().cloned());

    let evaluator = ProgressEvaluator::new(&student, request.flags);
    let excluded = request
        .current_major
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| format!("{m} Minor"));

    let mut results: Vec<MinorResult> = entries
        .iter()
        .filter(|e| excluded.as_deref() != Some(e.listing.name.as_str()))
        .map(|e| {
            let sections = normalize(&e.listing.name, &e.requirements.sections);
            evaluator.evaluate(&e.listing, &sections, &e.requirements.notes)
        })
        .filter(MinorResult::is_recommendable)
        .collect();
    results.sort_by(|a, b| b.percent.total_cmp(&a.percent));

    info!(
        candidates = entries.len(),
        matches = results.len(),
        "Ranked minors"
    );

    if results.is_empty() {
        Ok(Recommendations::NoMatches)
    } else {
        Ok(Recommendations::Ranked(results))
    }
}

/// Full pass for one request against `source`.
///
/// Invalid requests are rejected before anything is fetched.
pub async fn compute_recommendations<S: CatalogSource>(
    source: &S,
    request: &RecommendationRequest,
    concurrency: usize,
) -> Result<Recommendations, RecommendError> {
    request.validate()?;
    let entries = fetch_catalog(source, concurrency).await?;
    rank_minors(&entries, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::requirements::{CourseCode, MinorListing, RawItems};

    /// Fails the listing or one requirements page on demand.
    struct Flaky {
        inner: StaticCatalog,
        broken_link: Option<String>,
        broken_listing: bool,
    }

    impl Flaky {
        fn new(inner: StaticCatalog) -> Self {
            Self {
                inner,
                broken_link: None,
                broken_listing: false,
            }
        }
    }

    impl CatalogSource for Flaky {
        async fn list_minors(&self) -> Result<Vec<MinorListing>, CatalogError> {
            if self.broken_listing {
                return Err(CatalogError::Network {
                    message: "connection reset".to_string(),
                });
            }
            self.inner.list_minors().await
        }

        async fn get_requirements(&self, url: &str) -> Result<MinorRequirements, CatalogError> {
            if self.broken_link.as_deref() == Some(url) {
                return Err(CatalogError::UnexpectedResponse {
                    url: url.to_string(),
                    message: "status 500".to_string(),
                });
            }
            self.inner.get_requirements(url).await
        }

        async fn list_majors(&self) -> Result<Vec<String>, CatalogError> {
            self.inner.list_majors().await
        }
    }

    fn course(code: &str) -> CompletedCourse {
        CompletedCourse::institution(code.parse::<CourseCode>().unwrap(), 2)
    }

    fn entry(name: &str, sections: &[(&str, &[&str])], notes: &[&str]) -> CatalogEntry {
        CatalogEntry {
            listing: MinorListing {
                name: name.to_string(),
                link: format!("https://catalog.example.edu/{}", name.replace(' ', "-")),
            },
            requirements: MinorRequirements {
                sections: sections
                    .iter()
                    .map(|(title, items)| {
                        (
                            title.to_string(),
                            RawItems::Flat(items.iter().map(|i| i.to_string()).collect()),
                        )
                    })
                    .collect(),
                notes: notes.iter().map(|n| n.to_string()).collect(),
            },
        }
    }

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            entry(
                "Computer Science Minor",
                &[
                    ("A. Required Courses", &["CS18000", "CS18200", "CS24000"]),
                    ("B. Choose two", &["CS25000", "CS25100", "CS35200"]),
                ],
                &["At least 50% of the courses must be completed at Purdue."],
            ),
            entry(
                "Mathematics Minor",
                &[("A. Required Courses", &["MA16100", "MA16200"])],
                &[],
            ),
            entry("History Minor", &[("A. Required Courses", &["HIST10300"])], &[]),
            entry("Philosophy Minor", &[("A. Overview", &["See advisor"])], &[]),
        ]
    }

    fn request(codes: &[&str]) -> RecommendationRequest {
        RecommendationRequest {
            courses: codes.iter().map(|c| course(c)).collect(),
            current_semester: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_ranks_by_percent() {
        let outcome = rank_minors(&catalog(), &request(&["CS18000", "MA16100", "MA16200"])).unwrap();
        let names: Vec<_> = outcome.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Mathematics Minor", "Computer Science Minor"]);
        assert_eq!(outcome.results()[0].percent, 100.0);
        assert_eq!(outcome.results()[1].total_required, 5);
    }

    #[test]
    fn test_excludes_current_major() {
        let mut req = request(&["CS18000", "MA16100"]);
        req.current_major = Some("Computer Science".to_string());
        let outcome = rank_minors(&catalog(), &req).unwrap();
        assert!(outcome
            .results()
            .iter()
            .all(|r| r.name != "Computer Science Minor"));
        assert_eq!(outcome.results().len(), 1);
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let outcome = rank_minors(&catalog(), &request(&["CHEM11500"])).unwrap();
        assert_eq!(outcome, Recommendations::NoMatches);
    }

    #[test]
    fn test_empty_input_needs_courses() {
        assert!(matches!(
            rank_minors(&catalog(), &RecommendationRequest::default()),
            Err(RecommendError::NeedInput)
        ));
    }

    #[test]
    fn test_semester_out_of_range() {
        for semester in [0, 9, u32::MAX] {
            let mut req = request(&["CS18000"]);
            req.current_semester = semester;
            assert!(matches!(
                rank_minors(&catalog(), &req),
                Err(RecommendError::InvalidSemester(s)) if s == semester
            ));
        }
        let mut req = request(&["CS18000"]);
        req.current_semester = 8;
        assert!(rank_minors(&catalog(), &req).is_ok());
    }

    #[test]
    fn test_from_codes_marks_origin() {
        let req = RecommendationRequest::from_codes(
            vec!["CS18000".parse::<CourseCode>().unwrap()],
            vec!["MA16100".parse::<CourseCode>().unwrap()],
            3,
        );
        assert_eq!(req.courses.len(), 2);
        assert_eq!(req.courses[0].semester_taken, Some(3));
        assert_eq!(req.courses[1].semester_taken, None);
        assert_eq!(req.courses[1].origin, crate::requirements::Origin::External);
    }

    #[test]
    fn test_report_attaches_plan() {
        let outcome = rank_minors(&catalog(), &request(&["CS18000"])).unwrap();
        let report = RecommendationReport::build(&outcome, 3, Some(2));
        assert_eq!(report.status, "ranked");
        let cs = &report.minors[0];
        let plan = cs.plan.as_ref().unwrap();
        assert_eq!(plan[0].semester, 4);
        assert_eq!(plan[0].courses.len(), 2);
        assert_eq!(cs.pending.len(), cs.result.sections.len());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["minors"][0]["name"], "Computer Science Minor");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_report_for_no_matches() {
        let report = RecommendationReport::build(&Recommendations::NoMatches, 1, None);
        assert_eq!(report.status, "no_matches");
        assert_eq!(report.message, Some(NO_MATCHES_MESSAGE));
        assert!(report.minors.is_empty());
    }

    #[tokio::test]
    async fn test_failed_minor_is_dropped_not_fatal() {
        let mut source = Flaky::new(StaticCatalog::new(catalog(), vec![]));
        source.broken_link = Some("https://catalog.example.edu/Mathematics-Minor".to_string());
        let outcome = compute_recommendations(&source, &request(&["CS18000", "MA16100"]), 4)
            .await
            .unwrap();
        let names: Vec<_> = outcome.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Computer Science Minor"]);
    }

    #[tokio::test]
    async fn test_concurrent_fetch_keeps_order() {
        let source = StaticCatalog::new(catalog(), vec![]);
        let sequential = fetch_catalog(&source, 1).await.unwrap();
        let parallel = fetch_catalog(&source, 8).await.unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 4);
    }

    #[tokio::test]
    async fn test_need_input_skips_fetching() {
        let mut source = Flaky::new(StaticCatalog::new(catalog(), vec![]));
        source.broken_listing = true;
        let err = compute_recommendations(&source, &RecommendationRequest::default(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::NeedInput));
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let mut source = Flaky::new(StaticCatalog::new(catalog(), vec![]));
        source.broken_listing = true;
        let err = compute_recommendations(&source, &request(&["CS18000"]), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::Catalog(CatalogError::Network { .. })));
    }
}
