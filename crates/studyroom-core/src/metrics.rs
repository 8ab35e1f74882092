//! Derived presentation data.
//!
//! Pure functions over stored records: attendance percentages and chart
//! series, grade points and SGPA/CGPA, and the planner's engagement bands.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::academic::{Semester, SubjectEntry};
use crate::attendance::{AttendanceMap, AttendanceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub percentage: u32,
}

/// Present/absent counts for the bar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarSeries {
    pub labels: [&'static str; 2],
    pub values: [usize; 2],
}

/// One point of the attendance line chart: 1 present, 0 absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePoint {
    pub date: NaiveDate,
    pub value: u8,
}

fn present_count(map: &AttendanceMap) -> usize {
    map.values()
        .filter(|s| **s == AttendanceStatus::Present)
        .count()
}

/// `present / total * 100`, rounded; 0 when nothing is recorded.
pub fn attendance_percentage(map: &AttendanceMap) -> u32 {
    let total = map.len();
    if total == 0 {
        return 0;
    }
    (present_count(map) as f64 / total as f64 * 100.0).round() as u32
}

pub fn attendance_summary(map: &AttendanceMap) -> AttendanceSummary {
    let present = present_count(map);
    AttendanceSummary {
        total: map.len(),
        present,
        absent: map.len() - present,
        percentage: attendance_percentage(map),
    }
}

pub fn bar_series(map: &AttendanceMap) -> BarSeries {
    let present = present_count(map);
    BarSeries {
        labels: ["Present", "Absent"],
        values: [present, map.len() - present],
    }
}

/// Points in date order.
pub fn line_series(map: &AttendanceMap) -> Vec<LinePoint> {
    map.iter()
        .map(|(date, status)| LinePoint {
            date: *date,
            value: u8::from(*status == AttendanceStatus::Present),
        })
        .collect()
}

/// Grade point for a marks percentage.
pub fn grade_point(marks: f64) -> u8 {
    match marks {
        m if m >= 90.0 => 10,
        m if m >= 80.0 => 9,
        m if m >= 70.0 => 8,
        m if m >= 60.0 => 7,
        m if m >= 50.0 => 6,
        m if m >= 40.0 => 5,
        _ => 0,
    }
}

/// Credit-weighted grade-point average over `subjects`, formatted with two
/// decimals. Subjects whose marks or credits are not numbers do not count.
pub fn sgpa(subjects: &[SubjectEntry]) -> String {
    weighted_average(subjects.iter())
}

/// Same formula as [`sgpa`] over every subject of every semester.
pub fn cgpa(semesters: &[Semester]) -> String {
    weighted_average(semesters.iter().flat_map(|s| s.subjects.iter()))
}

fn weighted_average<'a>(subjects: impl Iterator<Item = &'a SubjectEntry>) -> String {
    let mut total_points = 0.0;
    let mut total_credits = 0.0;
    for subject in subjects {
        if let (Some(marks), Some(credits)) = (subject.marks_value(), subject.credits_value()) {
            total_points += f64::from(grade_point(marks)) * credits;
            total_credits += credits;
        }
    }
    if total_credits == 0.0 {
        return "0.00".to_string();
    }
    format!("{:.2}", total_points / total_credits)
}

/// Sum of numeric credits; non-numeric credits count as zero.
pub fn total_credits(subjects: &[SubjectEntry]) -> f64 {
    subjects.iter().filter_map(|s| s.credits_value()).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementLevel {
    Beginner,
    Intermediate,
    Pro,
    Master,
}

impl std::fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EngagementLevel::Beginner => "Beginner",
            EngagementLevel::Intermediate => "Intermediate",
            EngagementLevel::Pro => "Pro",
            EngagementLevel::Master => "Master",
        };
        f.write_str(s)
    }
}

pub fn engagement_level(event_count: usize) -> EngagementLevel {
    match event_count {
        n if n > 20 => EngagementLevel::Master,
        n if n > 10 => EngagementLevel::Pro,
        n if n > 5 => EngagementLevel::Intermediate,
        _ => EngagementLevel::Beginner,
    }
}

/// Percentage of the planner backdrop to fill for `event_count` events.
pub fn fill_level(event_count: usize) -> u8 {
    match event_count {
        n if n > 20 => 90,
        n if n > 15 => 75,
        n if n > 10 => 60,
        n if n > 5 => 40,
        n if n > 2 => 25,
        _ => 10,
    }
}
