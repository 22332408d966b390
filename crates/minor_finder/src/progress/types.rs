/// Types for per-minor progress results
use crate::requirements::{CourseCode, ExperienceGate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Experiences the student reports having completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceFlags {
    #[serde(default)]
    pub study_abroad: bool,
    #[serde(default)]
    pub international_internship: bool,
}

impl ExperienceFlags {
    /// Returns true if the experience behind `gate` is already fulfilled.
    pub fn fulfills(&self, gate: ExperienceGate) -> bool {
        match gate {
            ExperienceGate::StudyAbroad => self.study_abroad,
            ExperienceGate::InternationalInternship => self.international_internship,
        }
    }
}

/// What is still outstanding for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pending {
    /// Remaining codes (canonical form) and free-text options. Empty means
    /// the section is satisfied.
    Remaining(Vec<String>),
    /// Courses still needed for a level-threshold section.
    Count(u32),
    /// Not machine-checkable.
    Manual,
}

impl Pending {
    pub fn is_satisfied(&self) -> bool {
        match self {
            Pending::Remaining(items) => items.is_empty(),
            Pending::Count(n) => *n == 0,
            Pending::Manual => false,
        }
    }
}

/// Progress on one section (or on a collapsed either/or group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProgress {
    pub title: String,
    pub kind: String,
    pub required: u32,
    pub completed: u32,
    /// Whether this section's numbers count toward the minor's totals
    pub counted: bool,
    pub pending: Pending,
}

impl SectionProgress {
    pub fn remaining(&self) -> u32 {
        self.required.saturating_sub(self.completed)
    }
}

/// Residency rule derived from a "<N>%" note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residency {
    pub percent: u32,
    pub total: u32,
    pub required_on_institution: u32,
    pub allowed_external: u32,
    /// External credits among the codes counted toward this minor
    pub external_counted: u32,
    pub within_allowance: bool,
}

/// Outcome of evaluating one minor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinorResult {
    pub name: String,
    pub link: String,
    pub total_required: u32,
    pub total_completed: u32,
    pub percent: f64,
    pub taken_codes: BTreeSet<CourseCode>,
    pub sections: Vec<SectionProgress>,
    pub notes: Vec<String>,
    pub residency: Option<Residency>,
}

impl MinorResult {
    /// Section title -> pending state, as shown to the student.
    pub fn pending_by_section(&self) -> BTreeMap<String, Pending> {
        self.sections
            .iter()
            .map(|s| (s.title.clone(), s.pending.clone()))
            .collect()
    }

    /// A minor is worth recommending only if it has checkable requirements
    /// and the student has made some progress on them.
    pub fn is_recommendable(&self) -> bool {
        self.total_required > 0 && self.total_completed > 0
    }

    /// Course codes still listed as pending, in section order, without repeats.
    pub fn remaining_codes(&self) -> Vec<CourseCode> {
        let mut seen = BTreeSet::new();
        self.sections
            .iter()
            .filter_map(|s| match &s.pending {
                Pending::Remaining(items) => Some(items),
                _ => None,
            })
            .flatten()
            .filter_map(|item| CourseCode::from_catalog_item(item))
            .filter(|code| seen.insert(code.clone()))
            .collect()
    }
}

pub(crate) fn percent_of(completed: u32, required: u32) -> f64 {
    if required == 0 {
        0.0
    } else {
        100.0 * f64::from(completed) / f64::from(required)
    }
}
