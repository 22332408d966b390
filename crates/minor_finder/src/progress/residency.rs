//! Residency ("at least N% of courses at the home campus") accounting.

use super::types::Residency;
use crate::requirements::{CourseCode, Origin, StudentRecord};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static PERCENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").unwrap());

/// First percentage mentioned in the minor's notes, capped at 100.
pub fn residency_percent(notes: &[String]) -> Option<u32> {
    notes.iter().find_map(|note| {
        let caps = PERCENT_REGEX.captures(note)?;
        // Only digits are captured, so a parse failure means the number is too long
        let percent = caps[1].parse::<u64>().map_or(100, |p| p.min(100));
        u32::try_from(percent).ok()
    })
}

/// Builds the residency summary for a minor with `total` required courses.
///
/// Returns `None` when no note carries a percentage (or it is 0%).
pub fn residency_for(
    notes: &[String],
    total: u32,
    taken_codes: &BTreeSet<CourseCode>,
    student: &StudentRecord,
) -> Option<Residency> {
    let percent = residency_percent(notes).filter(|p| *p > 0)?;
    let required_on_institution = (u64::from(total) * u64::from(percent))
        .div_ceil(100)
        .try_into()
        .unwrap_or(total)
        .min(total);
    let allowed_external = total - required_on_institution;
    let external_counted = taken_codes
        .iter()
        .filter(|code| student.origin_of(code) == Some(Origin::External))
        .count() as u32;

    Some(Residency {
        percent,
        total,
        required_on_institution,
        allowed_external,
        external_counted,
        within_allowance: external_counted <= allowed_external,
    })
}
