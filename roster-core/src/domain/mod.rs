use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw employee row exactly as it was read from the source file.
///
/// Staging keeps every payload field as uninterpreted text; parsing and
/// cleanup happen downstream in the transform stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub employee_id: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub country: Option<String>,
    pub date_of_joining: Option<String>,
    pub years_experience: Option<String>,
    pub salary: Option<String>,
    pub performance_rating: Option<String>,
}

/// A cleaned employee record.
///
/// After the full transform sequence, `years_experience` and
/// `performance_rating` are always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub country: String,
    pub date_of_joining: Option<NaiveDate>,
    pub years_experience: Option<f64>,
    pub salary: Option<f64>,
    pub performance_rating: Option<PerformanceRating>,
}

/// The closed set of performance rating labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceRating {
    #[serde(rename = "Low Performers")]
    Low,
    #[serde(rename = "Average Performers")]
    Average,
    #[serde(rename = "High Performers")]
    High,
    #[serde(rename = "Top Performers")]
    Top,
}

impl PerformanceRating {
    pub const ALL: [PerformanceRating; 4] = [
        PerformanceRating::Low,
        PerformanceRating::Average,
        PerformanceRating::High,
        PerformanceRating::Top,
    ];

    /// Canonical label string for this rating.
    pub fn as_label(&self) -> &'static str {
        match self {
            PerformanceRating::Low => "Low Performers",
            PerformanceRating::Average => "Average Performers",
            PerformanceRating::High => "High Performers",
            PerformanceRating::Top => "Top Performers",
        }
    }

    /// Case-insensitive match against the canonical labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_label().to_lowercase() == wanted)
    }

    /// Stable integer encoding used by the rating classifier.
    pub fn index(&self) -> usize {
        match self {
            PerformanceRating::Low => 0,
            PerformanceRating::Average => 1,
            PerformanceRating::High => 2,
            PerformanceRating::Top => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Provenance for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub source_path: String,
    pub source_checksum: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn start(source_path: &str, source_checksum: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path: source_path.to_string(),
            source_checksum: source_checksum.to_string(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}
