//! # Archive Request and Result
//!
//! `ArchiveRequest` is what a backup orchestrator hands over; it is never
//! mutated by the run. `ArchiveResult` is built up file by file and is the
//! only structured report besides the manifests inside the archive.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::budget::TimeBudget;

/// Parameters for one archive run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRequest {
    /// Paths relative to `root_path`, processed in order.
    #[serde(default)]
    pub files: Vec<String>,
    /// Directory every relative path is resolved against.
    pub root_path: PathBuf,
    /// Whether each entry of `files` may be base64-wrapped.
    #[serde(default)]
    pub is_encoded: bool,
    /// Soft budget in seconds. Non-positive means unbounded.
    #[serde(default)]
    pub time_budget_seconds: f64,
}

impl ArchiveRequest {
    /// A request with no time budget and plain paths.
    pub fn new(root_path: impl Into<PathBuf>, files: Vec<String>) -> Self {
        Self {
            files,
            root_path: root_path.into(),
            is_encoded: false,
            time_budget_seconds: 0.0,
        }
    }

    /// Mark the paths as base64-wrapped.
    pub fn encoded(mut self, is_encoded: bool) -> Self {
        self.is_encoded = is_encoded;
        self
    }

    /// Set the soft time budget.
    pub fn with_time_budget(mut self, seconds: f64) -> Self {
        self.time_budget_seconds = seconds;
        self
    }

    /// The budget as a typed value.
    pub fn time_budget(&self) -> TimeBudget {
        TimeBudget::from_secs_f64(self.time_budget_seconds)
    }
}

/// Outcome of one archive run.
///
/// `files_added.len() + files_skipped.len() == processed <= files.len()`,
/// with `processed < files.len()` exactly when `truncated` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveResult {
    /// Paths written into the archive, in request order.
    pub files_added: Vec<String>,
    /// Paths that could not be included, in request order.
    pub files_skipped: Vec<String>,
    /// True when the budget or a stop signal ended the run early.
    pub truncated: bool,
    /// Number of requested paths consumed (added or skipped).
    pub processed: usize,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the archive was finalized.
    pub finished_at: DateTime<Utc>,
}

impl ArchiveResult {
    /// Requested paths the run never reached. A follow-up request with these
    /// files resumes where this run stopped.
    pub fn remaining<'r>(&self, request: &'r ArchiveRequest) -> &'r [String] {
        let start = self.processed.min(request.files.len());
        &request.files[start..]
    }
}
