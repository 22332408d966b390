//! Turns a minor's raw catalog sections into [`CanonicalRequirement`]s.
//!
//! Classification looks only at the title text and at which items read as
//! course codes, so the same input always yields the same kinds. Precedence:
//!
//! 1. no course codes: `CrossReference` when the text asks for an additional
//!    course from other sections, otherwise `Descriptive`
//! 2. title mentions "level": `LevelThreshold`
//! 3. title mentions "choose" or carries a `(N credits)` parenthetical: `ChooseN`
//! 4. otherwise `MandatoryAll`
//!
//! Unparseable counts never fail; each falls back to a conservative default.

use super::course::CourseCode;
use super::types::*;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;

static LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Z])\.\s*(?:[A-Z](\d{1,2})\b|(\d{1,2})[.)])?").unwrap()
});
static PAREN_CREDITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(\d+)\s*credits?\b").unwrap());
static BARE_CREDITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*credits?\b").unwrap());
static CHOOSE_DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)choose\s+(\d+)").unwrap());
static CHOOSE_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)choose\s+(one|two|three|four|five)\b").unwrap());
static LEVEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*-?\s*level").unwrap());
static ADDITIONAL_FROM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\badditional\b.*?\bfrom\b(.*)").unwrap());
// "A", "A or B", "sections A, B, or C": single capitals joined by commas, or, and
static SECTION_LIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[Tt]he\s+)?(?:[Ss]ections?\s+)?([A-Z]\b(?:\s*(?:,\s*(?:or|and)?|or|and)\s*[A-Z]\b)*)",
    )
    .unwrap()
});
static SECTION_LETTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z])\b").unwrap());
static STUDY_ABROAD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)study\s+abroad").unwrap());
static INTERNSHIP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)international\s+internship|internship\s+abroad").unwrap()
});

/// Normalizes every section of one minor.
pub fn normalize(minor_name: &str, sections: &RawSections) -> NormalizedSections {
    sections
        .iter()
        .map(|(title, items)| {
            let section = classify(minor_name, title, &items.flatten());
            debug!(
                minor = %minor_name,
                section = %title,
                kind = section.requirement.kind_name(),
                "Classified requirement section"
            );
            (title.clone(), section)
        })
        .collect()
}

/// Classifies a single section.
pub fn classify(minor_name: &str, title: &str, items: &[&str]) -> NormalizedSection {
    let lower = title.to_lowercase();
    let mut codes = BTreeSet::new();
    let mut options = Vec::new();

    for item in items {
        match CourseCode::from_catalog_item(item) {
            Some(code) => {
                codes.insert(code);
            }
            None => {
                let text = item.trim();
                if !text.is_empty() {
                    options.push(DescriptiveOption {
                        text: text.to_string(),
                        gate: experience_gate(text),
                    });
                }
            }
        }
    }

    let requirement = if codes.is_empty() {
        match cross_reference_sources(title, items) {
            Some(sources) => CanonicalRequirement::CrossReference { sources },
            None => CanonicalRequirement::Descriptive,
        }
    } else if lower.contains("level") {
        let credits = parenthetical_credits(title).unwrap_or(0);
        CanonicalRequirement::LevelThreshold {
            dept_prefix: dept_prefix(minor_name),
            min_level: min_level(title).unwrap_or(0),
            required_count: courses_for_credits(credits),
        }
    } else if lower.contains("choose") || parenthetical_credits(title).is_some() {
        codes.retain(|c| !c.is_placeholder());
        CanonicalRequirement::ChooseN {
            n: choose_count(title),
            codes,
        }
    } else {
        let required = match bare_credits(title) {
            Some(credits) => courses_for_credits(credits),
            None => codes.len() as u32,
        };
        CanonicalRequirement::MandatoryAll { codes, required }
    };

    NormalizedSection {
        title: title.to_string(),
        label: parse_label(title),
        requirement,
        options,
    }
}

/// Parses a leading `A.` / `C. 1.` / `C. C1` label.
pub fn parse_label(title: &str) -> Option<SectionLabel> {
    let caps = LABEL_REGEX.captures(title)?;
    let letter = caps.get(1)?.as_str().chars().next()?;
    let sub = caps
        .get(2)
        .or_else(|| caps.get(3))
        .and_then(|m| m.as_str().parse().ok());
    Some(SectionLabel { letter, sub })
}

/// `n` for a choose section: explicit digit, then word number, then
/// `credits / 3` with 3 credits assumed when nothing is stated.
pub fn choose_count(title: &str) -> u32 {
    if let Some(n) = CHOOSE_DIGIT_REGEX
        .captures(title)
        .and_then(|c| c[1].parse::<u32>().ok())
    {
        return n.max(1);
    }
    if let Some(caps) = CHOOSE_WORD_REGEX.captures(title) {
        return match caps[1].to_lowercase().as_str() {
            "one" => 1,
            "two" => 2,
            "three" => 3,
            "four" => 4,
            "five" => 5,
            _ => 1,
        };
    }
    courses_for_credits(parenthetical_credits(title).unwrap_or(3))
}

/// Department prefix guessed from the minor's name ("Statistics Minor" -> `STAT`).
pub fn dept_prefix(minor_name: &str) -> String {
    minor_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(4)
        .collect::<String>()
        .to_uppercase()
}

fn parenthetical_credits(title: &str) -> Option<u32> {
    PAREN_CREDITS_REGEX
        .captures(title)
        .and_then(|c| c[1].parse().ok())
}

fn bare_credits(title: &str) -> Option<u32> {
    BARE_CREDITS_REGEX
        .captures(title)
        .and_then(|c| c[1].parse().ok())
}

fn min_level(title: &str) -> Option<u32> {
    LEVEL_REGEX.captures(title).and_then(|c| c[1].parse().ok())
}

fn courses_for_credits(credits: u32) -> u32 {
    (credits / 3).max(1)
}

fn experience_gate(text: &str) -> Option<ExperienceGate> {
    if STUDY_ABROAD_REGEX.is_match(text) {
        Some(ExperienceGate::StudyAbroad)
    } else if INTERNSHIP_REGEX.is_match(text) {
        Some(ExperienceGate::InternationalInternship)
    } else {
        None
    }
}

/// Section letters named by "one additional course from A, B or C".
///
/// The text after "from" must start with a list of section letters; other
/// wording ("from Group I") is not a cross-reference.
fn cross_reference_sources(title: &str, items: &[&str]) -> Option<Vec<String>> {
    std::iter::once(title)
        .chain(items.iter().copied())
        .find_map(|text| {
            let tail = ADDITIONAL_FROM_REGEX.captures(text)?.get(1)?.as_str();
            let list = SECTION_LIST_REGEX.captures(tail)?.get(1)?.as_str();
            let letters: BTreeSet<String> = SECTION_LETTER_REGEX
                .captures_iter(list)
                .map(|c| c[1].to_string())
                .collect();
            if letters.is_empty() {
                None
            } else {
                Some(letters.into_iter().collect())
            }
        })
}
