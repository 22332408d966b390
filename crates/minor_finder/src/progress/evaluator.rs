//! Per-minor progress evaluation.
//!
//! Sections are evaluated in title order, with cross-reference sections last.
//! Choose-N sections draw from a pool of taken codes that shrinks as they
//! consume courses, so one course never satisfies two choose sections. A
//! mandatory section matches against the whole history and takes out of the
//! pool only the codes it actually counts. Within a section the lowest codes
//! (lexicographically) are consumed first.

use super::residency::residency_for;
use super::types::*;
use crate::requirements::{
    CanonicalRequirement, CourseCode, DescriptiveOption, MinorListing, NormalizedSection,
    NormalizedSections, StudentRecord,
};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::debug;

static ALTERNATIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(either|or|one of|options?)\b").unwrap());

/// Evaluates minors against one student's course history.
pub struct ProgressEvaluator<'a> {
    student: &'a StudentRecord,
    flags: ExperienceFlags,
}

impl<'a> ProgressEvaluator<'a> {
    pub fn new(student: &'a StudentRecord, flags: ExperienceFlags) -> Self {
        Self { student, flags }
    }

    /// Computes the progress record for one minor.
    ///
    /// Holds no state between calls: evaluating the same input twice gives the
    /// same result.
    pub fn evaluate(
        &self,
        listing: &MinorListing,
        sections: &NormalizedSections,
        notes: &[String],
    ) -> MinorResult {
        let layout = Layout::build(sections);
        let mut tally = Tally::new(self.student, self.flags, sections);

        let mut slots: Vec<(String, Vec<SectionProgress>)> = Vec::new();
        for unit in &layout.units {
            match unit {
                Unit::Single(section) => {
                    slots.push((section.title.clone(), vec![tally.section(section)]));
                }
                Unit::Group(group) => {
                    slots.push((group.anchor().to_string(), tally.either_or(group)));
                }
            }
        }
        for section in &layout.cross_refs {
            slots.push((section.title.clone(), vec![tally.section(section)]));
        }
        slots.sort_by(|a, b| a.0.cmp(&b.0));

        let sections: Vec<SectionProgress> =
            slots.into_iter().flat_map(|(_, progress)| progress).collect();
        let (total_required, total_completed) = sections
            .iter()
            .filter(|s| s.counted)
            .fold((0u32, 0u32), |(r, c), s| {
                (r.saturating_add(s.required), c.saturating_add(s.completed))
            });
        let taken_codes = tally.counted;
        let residency = residency_for(notes, total_required, &taken_codes, self.student);

        debug!(
            minor = %listing.name,
            required = total_required,
            completed = total_completed,
            "Evaluated minor"
        );

        MinorResult {
            name: listing.name.clone(),
            link: listing.link.clone(),
            total_required,
            total_completed,
            percent: percent_of(total_completed, total_required),
            taken_codes,
            sections,
            notes: notes.to_vec(),
            residency,
        }
    }
}

/// Two or more subsections that are alternative ways to meet one requirement.
struct EitherOr<'s> {
    parent: Option<&'s NormalizedSection>,
    alternatives: Vec<&'s NormalizedSection>,
}

impl EitherOr<'_> {
    fn anchor(&self) -> &str {
        self.parent
            .or_else(|| self.alternatives.first().copied())
            .map(|s| s.title.as_str())
            .unwrap_or_default()
    }

    fn collapsed_title(&self) -> String {
        match self.parent {
            Some(parent) => parent.title.clone(),
            None => self
                .alternatives
                .iter()
                .map(|s| s.title.as_str())
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

enum Unit<'s> {
    Single(&'s NormalizedSection),
    Group(EitherOr<'s>),
}

/// Processing plan for one minor's sections.
struct Layout<'s> {
    units: Vec<Unit<'s>>,
    cross_refs: Vec<&'s NormalizedSection>,
}

impl<'s> Layout<'s> {
    fn build(sections: &'s NormalizedSections) -> Self {
        let mut subs: BTreeMap<char, Vec<&'s NormalizedSection>> = BTreeMap::new();
        let mut parents: BTreeMap<char, &'s NormalizedSection> = BTreeMap::new();
        for section in sections.values() {
            let Some(label) = &section.label else { continue };
            if matches!(section.requirement, CanonicalRequirement::CrossReference { .. }) {
                continue;
            }
            match label.sub {
                Some(_) => subs.entry(label.letter).or_default().push(section),
                None if section.requirement == CanonicalRequirement::Descriptive => {
                    parents.entry(label.letter).or_insert(section);
                }
                None => {}
            }
        }

        let mut groups: BTreeMap<char, EitherOr<'s>> = subs
            .into_iter()
            .filter(|(_, alternatives)| alternatives.len() >= 2)
            .filter(|(letter, alternatives)| {
                parents
                    .get(letter)
                    .into_iter()
                    .chain(alternatives.iter())
                    .any(|s| ALTERNATIVE_REGEX.is_match(&s.title))
            })
            .map(|(letter, alternatives)| {
                let parent = parents.get(&letter).copied();
                (letter, EitherOr { parent, alternatives })
            })
            .collect();

        let members: BTreeMap<&str, char> = groups
            .iter()
            .flat_map(|(letter, g)| {
                g.parent
                    .into_iter()
                    .chain(g.alternatives.iter().copied())
                    .map(move |s| (s.title.as_str(), *letter))
            })
            .collect();

        let mut units = Vec::new();
        let mut cross_refs = Vec::new();
        for section in sections.values() {
            if matches!(section.requirement, CanonicalRequirement::CrossReference { .. }) {
                cross_refs.push(section);
                continue;
            }
            match members.get(section.title.as_str()) {
                // Emit the group once, at its first member
                Some(letter) => {
                    if let Some(group) = groups.remove(letter) {
                        units.push(Unit::Group(group));
                    }
                }
                None => units.push(Unit::Single(section)),
            }
        }

        Self { units, cross_refs }
    }
}

/// Running totals for one minor's evaluation.
#[derive(Clone)]
struct Tally<'a> {
    student: &'a StudentRecord,
    flags: ExperienceFlags,
    sections: &'a NormalizedSections,
    /// Taken codes still free for choose and cross-reference sections
    available: BTreeSet<CourseCode>,
    /// Codes counted toward this minor so far
    counted: BTreeSet<CourseCode>,
}

impl<'a> Tally<'a> {
    fn new(
        student: &'a StudentRecord,
        flags: ExperienceFlags,
        sections: &'a NormalizedSections,
    ) -> Self {
        Self {
            student,
            flags,
            sections,
            available: student.codes().clone(),
            counted: BTreeSet::new(),
        }
    }

    fn section(&mut self, section: &NormalizedSection) -> SectionProgress {
        let student = self.student;
        let taken = student.codes();
        let (required, completed, pending) = match &section.requirement {
            CanonicalRequirement::MandatoryAll { codes, required } => {
                let matched: Vec<&CourseCode> = codes.intersection(taken).collect();
                let completed = (matched.len() as u32).min(*required);
                for code in matched.into_iter().take(completed as usize) {
                    self.available.remove(code);
                    self.counted.insert(code.clone());
                }
                let pending = if completed >= *required {
                    Vec::new()
                } else {
                    self.unmet(codes, &section.options)
                };
                (*required, completed, Pending::Remaining(pending))
            }
            CanonicalRequirement::ChooseN { codes, n } => {
                let consumed: Vec<CourseCode> = codes
                    .intersection(&self.available)
                    .take(*n as usize)
                    .cloned()
                    .collect();
                let completed = consumed.len() as u32;
                for code in consumed {
                    self.available.remove(&code);
                    self.counted.insert(code);
                }
                let pending = if completed >= *n {
                    Vec::new()
                } else {
                    self.unmet(codes, &section.options)
                };
                (*n, completed, Pending::Remaining(pending))
            }
            CanonicalRequirement::LevelThreshold {
                dept_prefix,
                min_level,
                required_count,
            } => {
                let matched: Vec<&CourseCode> = taken
                    .iter()
                    .filter(|c| c.prefix() == dept_prefix && c.number() >= *min_level)
                    .collect();
                let completed = (matched.len() as u32).min(*required_count);
                self.counted
                    .extend(matched.into_iter().take(completed as usize).cloned());
                (
                    *required_count,
                    completed,
                    Pending::Count(required_count - completed),
                )
            }
            CanonicalRequirement::CrossReference { sources } => {
                let candidates = self.referenced_codes(sources);
                let pick = candidates
                    .iter()
                    .find(|c| taken.contains(*c) && !self.counted.contains(*c))
                    .cloned();
                match pick {
                    Some(code) => {
                        self.available.remove(&code);
                        self.counted.insert(code);
                        (1, 1, Pending::Remaining(Vec::new()))
                    }
                    None => (1, 0, Pending::Remaining(self.unmet(&candidates, &[]))),
                }
            }
            CanonicalRequirement::Descriptive => (0, 0, Pending::Manual),
        };

        SectionProgress {
            title: section.title.clone(),
            kind: section.requirement.kind_name().to_string(),
            required,
            completed,
            counted: true,
            pending,
        }
    }

    /// Evaluates each alternative on a copy of the pool and keeps one.
    ///
    /// The first fully satisfied alternative collapses the group into a single
    /// satisfied entry. Otherwise every alternative is reported and only the
    /// one with the best completion ratio counts toward the totals.
    fn either_or(&mut self, group: &EitherOr<'_>) -> Vec<SectionProgress> {
        let trials: Vec<(SectionProgress, Tally<'a>)> = group
            .alternatives
            .iter()
            .map(|alt| {
                let mut trial = self.clone();
                let progress = trial.section(alt);
                (progress, trial)
            })
            .collect();

        if let Some((progress, trial)) = trials
            .iter()
            .find(|(p, _)| p.required > 0 && p.pending.is_satisfied())
        {
            *self = trial.clone();
            return vec![SectionProgress {
                title: group.collapsed_title(),
                kind: "either_or".to_string(),
                required: progress.required,
                completed: progress.completed,
                counted: true,
                pending: Pending::Remaining(Vec::new()),
            }];
        }

        let mut best = 0;
        for (i, (progress, _)) in trials.iter().enumerate() {
            let current = &trials[best].0;
            if percent_of(progress.completed, progress.required)
                > percent_of(current.completed, current.required)
            {
                best = i;
            }
        }

        let mut out = Vec::new();
        if let Some(parent) = group.parent {
            let mut progress = self.section(parent);
            progress.counted = false;
            out.push(progress);
        }
        for (i, (mut progress, trial)) in trials.into_iter().enumerate() {
            progress.counted = i == best;
            if i == best {
                *self = trial;
            }
            out.push(progress);
        }
        out
    }

    /// Codes listed by the labelled sections, skipping other cross-references.
    fn referenced_codes(&self, sources: &[String]) -> BTreeSet<CourseCode> {
        self.sections
            .values()
            .filter(|s| {
                s.label
                    .as_ref()
                    .is_some_and(|l| sources.iter().any(|src| src.starts_with(l.letter)))
            })
            .filter_map(|s| s.requirement.listed_codes())
            .flatten()
            .cloned()
            .collect()
    }

    /// Untaken codes plus the free-text options still relevant to the student.
    fn unmet(&self, codes: &BTreeSet<CourseCode>, options: &[DescriptiveOption]) -> Vec<String> {
        let taken = self.student.codes();
        codes
            .iter()
            .filter(|c| !taken.contains(*c))
            .map(|c| c.as_str().to_string())
            .chain(
                options
                    .iter()
                    .filter(|o| !o.gate.is_some_and(|g| self.flags.fulfills(g)))
                    .map(|o| o.text.clone()),
            )
            .collect()
    }
}
