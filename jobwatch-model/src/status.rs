//! Display categories for free-text job statuses.

use std::fmt;

/// Filter value that disables status filtering.
pub const ALL_STATUSES: &str = "all";

/// Label shown for jobs that carry no status.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Semantic bucket a status string falls into.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Completed,
    InProgress,
    Pending,
    Failed,
    Unknown,
}

/// Match table in precedence order; the first category with a matching
/// needle wins.
const RULES: [(StatusCategory, &[&str]); 4] = [
    (StatusCategory::Completed, &["done", "completed", "finished"]),
    (StatusCategory::InProgress, &["in", "progress", "ongoing"]),
    (StatusCategory::Pending, &["pending"]),
    (StatusCategory::Failed, &["cancel", "failed", "error"]),
];

impl StatusCategory {
    /// Classify by case-insensitive substring match.
    ///
    /// Order matters: "in" is checked before "pending", so any status
    /// containing "pending" lands in [`StatusCategory::InProgress`].
    pub fn classify(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return StatusCategory::Unknown;
        };
        let lowered = status.to_lowercase();

        RULES
            .iter()
            .find(|(_, needles)| {
                needles.iter().any(|needle| lowered.contains(needle))
            })
            .map(|(category, _)| *category)
            .unwrap_or(StatusCategory::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusCategory::Completed => "Completed",
            StatusCategory::InProgress => "In progress",
            StatusCategory::Pending => "Pending",
            StatusCategory::Failed => "Failed",
            StatusCategory::Unknown => UNKNOWN_STATUS,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
