//! Check runner
//!
//! Runs every applicable check against every target database. Each
//! (database, check) pair is one tokio task with its own session; a
//! semaphore bounds how many are in flight. Tasks never affect each other:
//! a connection failure, query error, panic or timeout only decides that
//! task's outcome.

use crate::aggregator::Aggregator;
use crate::check::Check;
use crate::context::{CheckContext, PreviousDatabase};
use crate::error::CheckError;
use crate::registry::CheckRegistry;
use genocheck_core::{
    CheckOutcome, CheckStatus, Config, DatabaseIdentity, FindingCode, GroupSelection,
    MetadataCatalog, Report, ReportEntry, Severity,
};
use genocheck_session::SessionConnector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A database to check, with how to reach it
#[derive(Clone)]
pub struct DatabaseTarget {
    pub identity: DatabaseIdentity,
    pub connector: Arc<dyn SessionConnector>,
    pub previous: Option<PreviousDatabase>,
}

impl DatabaseTarget {
    pub fn new(identity: DatabaseIdentity, connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            identity,
            connector,
            previous: None,
        }
    }

    pub fn with_previous(mut self, previous: PreviousDatabase) -> Self {
        self.previous = Some(previous);
        self
    }
}

/// Runner settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Maximum tasks in flight
    pub max_parallel: usize,

    /// Wall-clock budget per task
    pub check_timeout: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        let config = Config::default();
        Self {
            max_parallel: config.max_parallel,
            check_timeout: config.check_timeout(),
        }
    }
}

impl RunnerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_parallel: config.max_parallel.max(1),
            check_timeout: config.check_timeout(),
        }
    }
}

/// How a task ended, before it becomes a [`CheckOutcome`]
enum TaskEnd {
    Finished { held: bool, errored: bool },
    Failed(CheckError),
    Panicked,
    Cancelled,
    TimedOut,
}

pub struct CheckRunner {
    registry: Arc<CheckRegistry>,
    catalog: Arc<dyn MetadataCatalog>,
    options: RunnerOptions,
}

impl CheckRunner {
    pub fn new(registry: Arc<CheckRegistry>, catalog: Arc<dyn MetadataCatalog>) -> Self {
        Self {
            registry,
            catalog,
            options: RunnerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RunnerOptions {
        self.options
    }

    /// (target index, check) pairs that would run
    pub fn plan(&self, targets: &[DatabaseTarget], selection: &GroupSelection) -> Vec<(usize, Arc<dyn Check>)> {
        targets
            .iter()
            .enumerate()
            .flat_map(|(idx, target)| {
                self.registry
                    .applicable(&target.identity, selection)
                    .into_iter()
                    .map(move |check| (idx, check))
            })
            .collect()
    }

    /// Run and return the finished report
    pub async fn run(&self, targets: &[DatabaseTarget], selection: &GroupSelection) -> Report {
        let aggregator = Aggregator::new();
        self.run_into(targets, selection, &aggregator).await;
        aggregator.report().await
    }

    /// Run, recording into an existing aggregator
    pub async fn run_into(&self, targets: &[DatabaseTarget], selection: &GroupSelection, aggregator: &Aggregator) {
        let plan = self.plan(targets, selection);
        let started = Instant::now();

        tracing::info!(
            databases = targets.len(),
            tasks = plan.len(),
            max_parallel = self.options.max_parallel,
            groups = ?selection.groups(),
            "starting check run"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_parallel.max(1)));
        let mut tasks = JoinSet::new();

        for (idx, check) in plan {
            let target = targets[idx].clone();
            let semaphore = Arc::clone(&semaphore);
            let catalog = Arc::clone(&self.catalog);
            let aggregator = aggregator.clone();
            let timeout = self.options.check_timeout;

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                run_task(check, target, catalog, aggregator, timeout).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "check task could not be joined");
            }
        }

        let report = aggregator.report().await;
        tracing::info!(
            checks_run = report.summary.checks_run,
            passed = report.summary.checks_passed,
            failed = report.summary.checks_failed,
            errored = report.summary.checks_errored,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "check run finished"
        );
    }
}

async fn run_task(
    check: Arc<dyn Check>,
    target: DatabaseTarget,
    catalog: Arc<dyn MetadataCatalog>,
    aggregator: Aggregator,
    timeout: Duration,
) {
    let metadata = check.metadata().clone();
    let name = metadata.name().to_string();
    let identity = target.identity.clone();
    let started = Instant::now();

    tracing::debug!(check = %name, database = %identity, "starting check");

    let inner = {
        let aggregator = aggregator.clone();
        let identity = identity.clone();
        tokio::spawn(async move {
            let session = target.connector.connect().await?;
            let mut ctx = CheckContext::new(check.metadata(), identity, session, catalog, aggregator)
                .with_previous(target.previous);
            let held = check.run(&mut ctx).await?;
            Ok::<_, CheckError>((held, ctx.errored()))
        })
    };
    let abort = inner.abort_handle();

    let end = match tokio::time::timeout(timeout, inner).await {
        Ok(Ok(Ok((held, errored)))) => TaskEnd::Finished { held, errored },
        Ok(Ok(Err(err))) => TaskEnd::Failed(err),
        Ok(Err(join)) if join.is_panic() => TaskEnd::Panicked,
        Ok(Err(_)) => TaskEnd::Cancelled,
        Err(_) => {
            abort.abort();
            TaskEnd::TimedOut
        }
    };

    let execution_error = |code: FindingCode, message: String| {
        ReportEntry::new(name.clone(), identity.clone(), Severity::Problem, code, message)
            .with_team(metadata.primary_team())
    };

    let (status, reason) = match end {
        TaskEnd::Finished { held: true, .. } => (CheckStatus::Passed, None),
        TaskEnd::Finished { held: false, errored: false } => (CheckStatus::Failed, None),
        TaskEnd::Finished { held: false, errored: true } => (
            CheckStatus::Error,
            Some("one or more assertions could not be executed".to_string()),
        ),
        TaskEnd::Failed(err) => {
            tracing::warn!(check = %name, database = %identity, error = %err, "check failed to run");
            aggregator.record(execution_error(err.code(), err.to_string())).await;
            // Missing configuration was verified as a problem, not a failure to verify
            let status = if err.code().is_execution_error() {
                CheckStatus::Error
            } else {
                CheckStatus::Failed
            };
            (status, Some(err.to_string()))
        }
        TaskEnd::Panicked | TaskEnd::Cancelled => {
            let reason = "check aborted unexpectedly".to_string();
            tracing::warn!(check = %name, database = %identity, "check aborted");
            aggregator
                .record(execution_error(FindingCode::CheckAborted, reason.clone()))
                .await;
            (CheckStatus::Error, Some(reason))
        }
        TaskEnd::TimedOut => {
            let reason = format!("check exceeded its {}s budget", timeout.as_secs_f64());
            tracing::warn!(check = %name, database = %identity, timeout_secs = timeout.as_secs_f64(), "check timed out");
            aggregator
                .record(execution_error(FindingCode::CheckTimeout, reason.clone()))
                .await;
            (CheckStatus::Error, Some(reason))
        }
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::debug!(check = %name, database = %identity, status = %status, elapsed_ms, "check finished");

    aggregator
        .record_outcome(CheckOutcome {
            check: name,
            database: identity,
            status,
            reason,
            elapsed_ms,
        })
        .await;
}
