//! Teacher-dashboard datasets, served as structured data so the shell
//! renders them locally instead of splicing markup.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub label: &'static str,
    pub average_score: f64,
}

/// Per-term average scores shown on the performance trend chart.
pub const PERFORMANCE_TREND: &[TrendPoint] = &[
    TrendPoint {
        label: "Term 1",
        average_score: 75.0,
    },
    TrendPoint {
        label: "Term 2",
        average_score: 82.0,
    },
    TrendPoint {
        label: "Term 3",
        average_score: 78.0,
    },
];

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    pub name: &'static str,
    pub subject: &'static str,
    pub score: u32,
    pub grade: &'static str,
}

/// Sample rows for the dashboard results table.
pub const STUDENT_RESULTS: &[StudentResult] = &[
    StudentResult {
        name: "Alice Johnson",
        subject: "Math",
        score: 85,
        grade: "A",
    },
    StudentResult {
        name: "Bob Smith",
        subject: "Science",
        score: 78,
        grade: "B",
    },
    StudentResult {
        name: "Charlie Brown",
        subject: "English",
        score: 92,
        grade: "A",
    },
];
