//! Per-task check context
//!
//! A [`CheckContext`] is what a check sees while it runs: its own database
//! session, the database identity, the metadata catalog, the previous
//! release (if registered) and the run's aggregator. Entries emitted through
//! the context are stamped with the check name and primary team.

use crate::aggregator::Aggregator;
use crate::error::CheckError;
use genocheck_core::{
    CheckMetadata, DatabaseIdentity, FindingCode, MetadataCatalog, ReportEntry, Severity, Team,
};
use genocheck_session::{DatabaseSession, SessionConnector};
use std::sync::Arc;

/// Previous-release counterpart of a database under test
#[derive(Clone)]
pub struct PreviousDatabase {
    pub identity: DatabaseIdentity,
    pub connector: Arc<dyn SessionConnector>,
}

impl PreviousDatabase {
    pub fn new(identity: DatabaseIdentity, connector: Arc<dyn SessionConnector>) -> Self {
        Self { identity, connector }
    }
}

impl std::fmt::Debug for PreviousDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviousDatabase")
            .field("identity", &self.identity)
            .field("connector", &self.connector.describe())
            .finish()
    }
}

pub struct CheckContext {
    check: String,
    team: Option<Team>,
    identity: DatabaseIdentity,
    session: Box<dyn DatabaseSession>,
    catalog: Arc<dyn MetadataCatalog>,
    aggregator: Aggregator,
    previous: Option<PreviousDatabase>,
    errored: bool,
}

impl CheckContext {
    pub fn new(
        metadata: &CheckMetadata,
        identity: DatabaseIdentity,
        session: Box<dyn DatabaseSession>,
        catalog: Arc<dyn MetadataCatalog>,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            check: metadata.name().to_string(),
            team: metadata.primary_team(),
            identity,
            session,
            catalog,
            aggregator,
            previous: None,
            errored: false,
        }
    }

    pub fn with_previous(mut self, previous: Option<PreviousDatabase>) -> Self {
        self.previous = previous;
        self
    }

    pub fn check_name(&self) -> &str {
        &self.check
    }

    pub fn identity(&self) -> &DatabaseIdentity {
        &self.identity
    }

    pub fn session(&self) -> &dyn DatabaseSession {
        self.session.as_ref()
    }

    pub fn catalog(&self) -> &dyn MetadataCatalog {
        self.catalog.as_ref()
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn previous(&self) -> Option<&PreviousDatabase> {
        self.previous.as_ref()
    }

    /// Whether an execution error was settled locally during this run
    pub fn errored(&self) -> bool {
        self.errored
    }

    /// Open a session to the previous release, if one is registered
    pub async fn open_previous(
        &self,
    ) -> Result<Option<(DatabaseIdentity, Box<dyn DatabaseSession>)>, CheckError> {
        match &self.previous {
            Some(previous) => {
                let session = previous.connector.connect().await?;
                Ok(Some((previous.identity.clone(), session)))
            }
            None => Ok(None),
        }
    }

    /// Start an entry for this check and database
    pub fn entry(&self, severity: Severity, code: FindingCode, message: impl Into<String>) -> ReportEntry {
        ReportEntry::new(self.check.clone(), self.identity.clone(), severity, code, message)
            .with_team(self.team)
    }

    pub async fn record(&self, entry: ReportEntry) {
        self.aggregator.record(entry).await;
    }

    pub async fn emit(&self, severity: Severity, code: FindingCode, message: impl Into<String>) {
        self.record(self.entry(severity, code, message)).await;
    }

    pub async fn correct(&self, code: FindingCode, message: impl Into<String>) {
        self.emit(Severity::Correct, code, message).await;
    }

    pub async fn info(&self, code: FindingCode, message: impl Into<String>) {
        self.emit(Severity::Info, code, message).await;
    }

    pub async fn warning(&self, code: FindingCode, message: impl Into<String>) {
        self.emit(Severity::Warning, code, message).await;
    }

    pub async fn problem(&self, code: FindingCode, message: impl Into<String>) {
        self.emit(Severity::Problem, code, message).await;
    }

    /// Record missing metadata that blocks verification
    pub async fn configuration_problem(&self, message: impl Into<String>) {
        self.problem(FindingCode::MissingConfiguration, message).await;
    }

    /// Resolve one assertion's result without aborting the check
    ///
    /// Errors are recorded as PROBLEM entries carrying the error's code and
    /// the assertion counts as failed.
    pub async fn settle(&mut self, result: Result<bool, CheckError>) -> bool {
        match result {
            Ok(held) => held,
            Err(err) => {
                if err.code().is_execution_error() {
                    self.errored = true;
                }
                tracing::debug!(check = %self.check, database = %self.identity, error = %err, "assertion could not run");
                self.problem(err.code(), err.to_string()).await;
                false
            }
        }
    }
}
