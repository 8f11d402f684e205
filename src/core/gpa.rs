use serde::{Deserialize, Serialize};

use crate::models::{CourseEntry, SemesterEntry};

/// Supported grading scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradingScale {
    #[serde(rename = "10-point")]
    TenPoint,
    #[serde(rename = "4-point")]
    FourPoint,
}

impl GradingScale {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "10-point" | "10" => Some(GradingScale::TenPoint),
            "4-point" | "4" => Some(GradingScale::FourPoint),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GradingScale::TenPoint => "10-point",
            GradingScale::FourPoint => "4-point",
        }
    }

    /// Grade points for a letter grade; unknown grades earn nothing
    pub fn grade_points(&self, grade: &str) -> f64 {
        let grade = grade.trim().to_ascii_uppercase();
        match self {
            GradingScale::TenPoint => match grade.as_str() {
                "O" => 10.0,
                "A+" => 9.0,
                "A" => 8.0,
                "B+" => 7.0,
                "B" => 6.0,
                "C" => 5.0,
                "P" => 4.0,
                _ => 0.0,
            },
            GradingScale::FourPoint => match grade.as_str() {
                "A" => 4.0,
                "A-" => 3.7,
                "B+" => 3.3,
                "B" => 3.0,
                "B-" => 2.7,
                "C+" => 2.3,
                "C" => 2.0,
                "C-" => 1.7,
                "D" => 1.0,
                _ => 0.0,
            },
        }
    }
}

/// Credit-weighted average
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpaSummary {
    pub total_credits: f64,
    pub total_grade_points: f64,
    pub gpa: f64,
}

/// Round to two decimals for presentation
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn weighted(pairs: impl Iterator<Item = (f64, f64)>) -> Option<GpaSummary> {
    let (total_credits, total_grade_points) = pairs
        .filter(|(credits, points)| credits.is_finite() && *credits > 0.0 && points.is_finite())
        .fold((0.0, 0.0), |(credits, weighted), (c, p)| (credits + c, weighted + c * p));

    if total_credits <= 0.0 {
        return None;
    }

    Some(GpaSummary {
        total_credits,
        total_grade_points,
        gpa: total_grade_points / total_credits,
    })
}

/// Semester GPA over course rows; rows without positive credits are skipped
pub fn sgpa(scale: GradingScale, courses: &[CourseEntry]) -> Option<GpaSummary> {
    weighted(courses.iter().map(|course| {
        let credits = course.credits.unwrap_or(0.0);
        let points = course
            .grade
            .as_deref()
            .map_or(0.0, |grade| scale.grade_points(grade));
        (credits, points)
    }))
}

/// Cumulative GPA over semester rows
pub fn cgpa(semesters: &[SemesterEntry]) -> Option<GpaSummary> {
    weighted(
        semesters
            .iter()
            .map(|semester| (semester.credits.unwrap_or(0.0), semester.sgpa.unwrap_or(f64::NAN))),
    )
}
