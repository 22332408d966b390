/// Types for raw and normalized minor requirements
use super::course::CourseCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Items listed under one catalog heading.
///
/// Catalog pages usually give a flat list, but a section may also carry
/// OR-groups as a list of lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItems {
    Flat(Vec<String>),
    Grouped(Vec<Vec<String>>),
}

impl RawItems {
    /// Every item, with OR-groups flattened in order.
    pub fn flatten(&self) -> Vec<&str> {
        match self {
            RawItems::Flat(items) => items.iter().map(String::as_str).collect(),
            RawItems::Grouped(groups) => groups
                .iter()
                .flat_map(|g| g.iter().map(String::as_str))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flatten().is_empty()
    }
}

impl Default for RawItems {
    fn default() -> Self {
        RawItems::Flat(Vec::new())
    }
}

impl From<Vec<String>> for RawItems {
    fn from(items: Vec<String>) -> Self {
        RawItems::Flat(items)
    }
}

/// Section title -> items. Ordered by title.
pub type RawSections = BTreeMap<String, RawItems>;

/// Everything the catalog says about one minor's requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorRequirements {
    #[serde(default)]
    pub sections: RawSections,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// A minor as listed on the catalog index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorListing {
    pub name: String,
    pub link: String,
}

/// External experience that can stand in for part of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceGate {
    StudyAbroad,
    InternationalInternship,
}

/// A free-text option listed next to course codes ("Study abroad experience").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptiveOption {
    pub text: String,
    pub gate: Option<ExperienceGate>,
}

/// Machine-checkable form of a requirement section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalRequirement {
    /// Every listed code, or `required` of them when a credit count sizes
    /// the section.
    MandatoryAll {
        codes: BTreeSet<CourseCode>,
        required: u32,
    },
    /// Any `n` of the listed codes.
    ChooseN { codes: BTreeSet<CourseCode>, n: u32 },
    /// `required_count` courses with `dept_prefix` numbered at least
    /// `min_level`, drawn from the whole course history.
    LevelThreshold {
        dept_prefix: String,
        min_level: u32,
        required_count: u32,
    },
    /// One more course from the sections labelled in `sources`.
    CrossReference { sources: Vec<String> },
    /// Nothing checkable; reported as manual.
    Descriptive,
}

impl CanonicalRequirement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            CanonicalRequirement::MandatoryAll { .. } => "mandatory_all",
            CanonicalRequirement::ChooseN { .. } => "choose_n",
            CanonicalRequirement::LevelThreshold { .. } => "level_threshold",
            CanonicalRequirement::CrossReference { .. } => "cross_reference",
            CanonicalRequirement::Descriptive => "descriptive",
        }
    }

    /// Codes explicitly listed by the section, if any.
    pub fn listed_codes(&self) -> Option<&BTreeSet<CourseCode>> {
        match self {
            CanonicalRequirement::MandatoryAll { codes, .. }
            | CanonicalRequirement::ChooseN { codes, .. } => Some(codes),
            _ => None,
        }
    }
}

/// Leading label of a section title, e.g. `A.` or `C. 1.`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionLabel {
    pub letter: char,
    pub sub: Option<u32>,
}

impl std::fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}. {}", self.letter, sub),
            None => write!(f, "{}", self.letter),
        }
    }
}

/// One section after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSection {
    pub title: String,
    pub label: Option<SectionLabel>,
    pub requirement: CanonicalRequirement,
    /// Free-text items kept alongside the codes
    pub options: Vec<DescriptiveOption>,
}

/// Section title -> normalized section.
pub type NormalizedSections = BTreeMap<String, NormalizedSection>;
