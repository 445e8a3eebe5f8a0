//! Finding codes, severity levels and report entries
//!
//! IMPORTANT: Finding codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the report format.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

use crate::identity::DatabaseIdentity;
use crate::metadata::Team;

/// Finding code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    // Referential integrity
    /// Child rows reference a parent row that does not exist
    OrphanRows,

    /// Child rows in a mandatory relation carry a NULL key
    NullForeignKey,

    /// Optional relation checked (NULL keys allowed)
    OptionalRelation,

    // Identifier integrity
    /// Duplicate values in a column expected to be unique
    DuplicateKeys,

    /// NULL values in a column expected to be populated
    NullValues,

    /// Identifiers without the expected species prefix
    WrongPrefix,

    // Row-level assertions
    /// A count-must-be-zero assertion
    RowCount,

    /// Table has no rows, nothing to test
    EmptyTable,

    // Version drift
    /// Grouped count dropped below the drift threshold
    CountDrift,

    /// Category present now but absent in the previous release
    NewCategory,

    /// No previous release database registered
    NoPreviousRelease,

    // Could not verify
    /// Required metadata is missing (e.g. no stable ID prefix for a species)
    MissingConfiguration,

    /// A query could not be executed
    QueryFailed,

    /// The database could not be reached
    ConnectionFailed,

    /// The check exceeded its wall-clock budget
    CheckTimeout,

    /// The check aborted unexpectedly
    CheckAborted,

    // General
    /// Free-form assertion emitted by a check
    Assertion,
}

impl FindingCode {
    /// Get the finding code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrphanRows => "ORPHAN_ROWS",
            Self::NullForeignKey => "NULL_FOREIGN_KEY",
            Self::OptionalRelation => "OPTIONAL_RELATION",
            Self::DuplicateKeys => "DUPLICATE_KEYS",
            Self::NullValues => "NULL_VALUES",
            Self::WrongPrefix => "WRONG_PREFIX",
            Self::RowCount => "ROW_COUNT",
            Self::EmptyTable => "EMPTY_TABLE",
            Self::CountDrift => "COUNT_DRIFT",
            Self::NewCategory => "NEW_CATEGORY",
            Self::NoPreviousRelease => "NO_PREVIOUS_RELEASE",
            Self::MissingConfiguration => "MISSING_CONFIGURATION",
            Self::QueryFailed => "QUERY_FAILED",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::CheckTimeout => "CHECK_TIMEOUT",
            Self::CheckAborted => "CHECK_ABORTED",
            Self::Assertion => "ASSERTION",
        }
    }

    /// Whether this code means the invariant could not be verified at all
    ///
    /// Execution codes are reported as ERROR, apart from data violations.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            Self::QueryFailed | Self::ConnectionFailed | Self::CheckTimeout | Self::CheckAborted
        )
    }
}

impl std::fmt::Display for FindingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Report severity level
///
/// Totally ordered. `All` and `None` are sentinels for output filtering
/// and are never emitted by a check. The numeric levels are spaced so
/// intermediate levels can be added without renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Lower than every real level ("show everything")
    All,

    /// Invariant explicitly verified and held
    Correct,

    /// Noteworthy but non-blocking
    Info,

    /// Should be reviewed, does not fail the check
    Warning,

    /// Invariant violated
    Problem,

    /// Higher than every real level ("show nothing")
    None,
}

impl Severity {
    /// Every level, lowest first
    pub const ALL_LEVELS: [Severity; 6] = [
        Self::All,
        Self::Correct,
        Self::Info,
        Self::Warning,
        Self::Problem,
        Self::None,
    ];

    /// Numeric level
    pub fn level(&self) -> u16 {
        match self {
            Self::All => 0,
            Self::Correct => 100,
            Self::Info => 500,
            Self::Warning => 750,
            Self::Problem => 1000,
            Self::None => 2000,
        }
    }

    /// Whether a check may emit an entry at this level
    pub fn is_emittable(&self) -> bool {
        !matches!(self, Self::All | Self::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Correct => "CORRECT",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Problem => "PROBLEM",
            Self::None => "NONE",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown severity '{}', expected one of ALL, CORRECT, INFO, WARNING, PROBLEM, NONE",
                    s
                )
            })
    }
}

/// A single finding emitted by a check against one database
///
/// Entries are immutable once built; the aggregator owns them after
/// emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Name of the check that produced the finding
    pub check: String,

    /// Database the finding refers to
    pub database: DatabaseIdentity,

    /// Severity level
    pub severity: Severity,

    /// Stable finding code
    pub code: FindingCode,

    /// Human-readable message
    pub message: String,

    /// Team responsible for triage
    pub team: Option<Team>,

    /// Expected value (for comparison findings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Actual value (for comparison findings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ReportEntry {
    /// Create a new entry with minimal fields
    pub fn new(
        check: impl Into<String>,
        database: DatabaseIdentity,
        severity: Severity,
        code: FindingCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            database,
            severity,
            code,
            message: message.into(),
            team: None,
            expected: None,
            actual: None,
        }
    }

    /// Set the responsible team
    pub fn with_team(mut self, team: Option<Team>) -> Self {
        self.team = team;
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// Set only the actual value (e.g. a violation count)
    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}
