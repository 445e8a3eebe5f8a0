//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::finding::{ReportEntry, Severity};
use crate::identity::DatabaseIdentity;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Final status of one (database, check) execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// Every assertion held
    Passed,

    /// At least one assertion was violated
    Failed,

    /// The check could not verify the database (connection, query, timeout)
    Error,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of one (database, check) task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: String,

    pub database: DatabaseIdentity,

    pub status: CheckStatus,

    /// Why the check could not verify the database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Wall-clock time spent in milliseconds
    pub elapsed_ms: u64,
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of entries
    pub total: usize,

    pub problems: usize,

    pub warnings: usize,

    pub info: usize,

    pub correct: usize,

    /// Entries that record an execution failure (subset of `problems`)
    pub execution_errors: usize,

    /// Number of (database, check) pairs executed
    pub checks_run: usize,

    pub checks_passed: usize,

    pub checks_failed: usize,

    pub checks_errored: usize,
}

/// Run report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Per-task outcomes
    pub outcomes: Vec<CheckOutcome>,

    /// All entries
    pub entries: Vec<ReportEntry>,

    /// Metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Report {
    /// Create a report from recorded outcomes and entries
    pub fn from_parts(outcomes: Vec<CheckOutcome>, entries: Vec<ReportEntry>) -> Self {
        let count = |severity: Severity| entries.iter().filter(|e| e.severity == severity).count();
        let status = |status: CheckStatus| outcomes.iter().filter(|o| o.status == status).count();

        let summary = ReportSummary {
            total: entries.len(),
            problems: count(Severity::Problem),
            warnings: count(Severity::Warning),
            info: count(Severity::Info),
            correct: count(Severity::Correct),
            execution_errors: entries.iter().filter(|e| e.code.is_execution_error()).count(),
            checks_run: outcomes.len(),
            checks_passed: status(CheckStatus::Passed),
            checks_failed: status(CheckStatus::Failed),
            checks_errored: status(CheckStatus::Error),
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            outcomes,
            entries,
            metadata: None,
        }
    }

    /// Attach free-form metadata (selected groups, config path, ...)
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The run passes only if no executed check failed or errored
    pub fn passed(&self) -> bool {
        self.summary.checks_failed == 0 && self.summary.checks_errored == 0
    }

    /// Entries at or above `min`
    pub fn entries_at_least(&self, min: Severity) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.severity >= min)
    }

    /// Entries grouped by responsible team (entries without a team under "unassigned")
    pub fn entries_by_team(&self) -> BTreeMap<String, Vec<&ReportEntry>> {
        let mut grouped: BTreeMap<String, Vec<&ReportEntry>> = BTreeMap::new();
        for entry in &self.entries {
            let team = entry
                .team
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| "unassigned".to_string());
            grouped.entry(team).or_default().push(entry);
        }
        grouped
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
