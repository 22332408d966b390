//! Buckets remaining courses into upcoming semesters.

use crate::requirements::CourseCode;
use serde::{Deserialize, Serialize};

/// Courses suggested for one future semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterPlan {
    pub semester: u32,
    pub courses: Vec<CourseCode>,
}

impl SemesterPlan {
    pub fn label(&self) -> String {
        format!("Semester {}", self.semester)
    }
}

/// Splits `remaining` into chunks of `per_semester`, starting the semester
/// after `current_semester`. Order of `remaining` is kept.
pub fn plan_remaining(
    remaining: &[CourseCode],
    current_semester: u32,
    per_semester: usize,
) -> Vec<SemesterPlan> {
    let first = current_semester.saturating_add(1);
    remaining
        .chunks(per_semester.max(1))
        .enumerate()
        .map(|(i, chunk)| SemesterPlan {
            semester: first.saturating_add(u32::try_from(i).unwrap_or(u32::MAX)),
            courses: chunk.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(n: usize) -> Vec<CourseCode> {
        (0..n)
            .map(|i| format!("CS{}", 18000 + i * 100).parse().unwrap())
            .collect()
    }

    #[test]
    fn test_chunks_start_next_semester() {
        let plan = plan_remaining(&codes(6), 3, 4);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].label(), "Semester 4");
        assert_eq!(plan[0].courses.len(), 4);
        assert_eq!(plan[1].semester, 5);
        assert_eq!(plan[1].courses.len(), 2);
    }

    #[test]
    fn test_empty_and_zero_chunk() {
        assert!(plan_remaining(&[], 1, 4).is_empty());
        assert_eq!(plan_remaining(&codes(2), 1, 0).len(), 2);
    }

    #[test]
    fn test_last_semester_does_not_overflow() {
        let plan = plan_remaining(&codes(5), u32::MAX, 4);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].semester, u32::MAX);
        assert_eq!(plan[1].semester, u32::MAX);
    }
}
