//! Server-computed aggregate report.

use serde::{Deserialize, Serialize};

use super::project::Status;

/// Count of projects in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: Status,
    pub count: u64,
}

/// Body of `GET /reports/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total: u64,
    pub completed: u64,
    /// `null` when there are no projects.
    #[serde(default)]
    pub avg_progress: Option<f64>,
    #[serde(default)]
    pub by_status: Vec<StatusCount>,
}

impl Report {
    /// Average progress rounded to a whole percentage.
    pub fn avg_progress_percent(&self) -> u32 {
        self.avg_progress
            .map(|p| p.clamp(0.0, 100.0).round() as u32)
            .unwrap_or(0)
    }
}
