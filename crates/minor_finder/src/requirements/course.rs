//! Course codes and the student's completed-course snapshot.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{2,4})(\d{3,5})$").unwrap());

/// Error returned when user input cannot be read as a course code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid course code: {input:?} (expected e.g. \"CS 18000\")")]
pub struct CourseCodeError {
    pub input: String,
}

/// A canonical course code such as `CS18000`.
///
/// The canonical form has no whitespace: 2-4 uppercase letters followed by
/// 3-5 digits. All set operations in the crate work on this form; the spaced
/// form (`CS 18000`) only exists at display time, see [`CourseCode::spaced`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode(String);

impl CourseCode {
    /// Reads a catalog item as a course code.
    ///
    /// Only internal whitespace is removed; case is not touched, so free-text
    /// items ("Study abroad experience") never match.
    pub fn from_catalog_item(item: &str) -> Option<Self> {
        let compact: String = item.chars().filter(|c| !c.is_whitespace()).collect();
        if CODE_REGEX.is_match(&compact) {
            Some(Self(compact))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Letter prefix, e.g. `STAT` for `STAT35000`.
    pub fn prefix(&self) -> &str {
        let split = self.split_index();
        &self.0[..split]
    }

    /// Numeric part as written, e.g. `35000`.
    pub fn number_str(&self) -> &str {
        let split = self.split_index();
        &self.0[split..]
    }

    /// Numeric part as an integer, used for course-level thresholds.
    pub fn number(&self) -> u32 {
        self.number_str().parse().unwrap_or(0)
    }

    /// Catalog filler entries such as `ENGL10000` end in four zeros.
    pub fn is_placeholder(&self) -> bool {
        self.0.ends_with("0000")
    }

    /// Display form with a single space between prefix and number.
    pub fn spaced(&self) -> String {
        format!("{} {}", self.prefix(), self.number_str())
    }

    fn split_index(&self) -> usize {
        self.0
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(self.0.len())
    }
}

impl FromStr for CourseCode {
    type Err = CourseCodeError;

    /// Parses user input leniently: surrounding and internal whitespace is
    /// dropped and letters are uppercased (`"cs 180 00"` -> `CS18000`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if CODE_REGEX.is_match(&compact) {
            Ok(Self(compact))
        } else {
            Err(CourseCodeError {
                input: s.to_string(),
            })
        }
    }
}

impl TryFrom<String> for CourseCode {
    type Error = CourseCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CourseCode> for String {
    fn from(code: CourseCode) -> Self {
        code.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the credit for a course was earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Institution,
    External,
}

/// A course the student has credit for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedCourse {
    pub code: CourseCode,
    /// 1..=8 for courses taken here, `None` for transfer/test credit
    #[serde(default)]
    pub semester_taken: Option<u8>,
    #[serde(default)]
    pub origin: Origin,
}

impl CompletedCourse {
    pub fn institution(code: CourseCode, semester_taken: u8) -> Self {
        Self {
            code,
            semester_taken: Some(semester_taken.clamp(1, 8)),
            origin: Origin::Institution,
        }
    }

    pub fn external(code: CourseCode) -> Self {
        Self {
            code,
            semester_taken: None,
            origin: Origin::External,
        }
    }
}

/// Immutable snapshot of the student's course history for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentRecord {
    courses: Vec<CompletedCourse>,
    codes: BTreeSet<CourseCode>,
}

impl StudentRecord {
    /// Builds the snapshot, keeping the first entry when a code repeats.
    pub fn new(courses: impl IntoIterator<Item = CompletedCourse>) -> Self {
        let mut codes = BTreeSet::new();
        let courses = courses
            .into_iter()
            .filter(|c| codes.insert(c.code.clone()))
            .collect();
        Self { courses, codes }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &BTreeSet<CourseCode> {
        &self.codes
    }

    pub fn courses(&self) -> &[CompletedCourse] {
        &self.courses
    }

    pub fn origin_of(&self, code: &CourseCode) -> Option<Origin> {
        self.courses
            .iter()
            .find(|c| &c.code == code)
            .map(|c| c.origin)
    }
}

/// Parses a comma-separated list of user-entered codes.
///
/// Blank entries are skipped; the first invalid entry is returned as an error.
pub fn parse_code_list(input: &str) -> Result<Vec<CourseCode>, CourseCodeError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
