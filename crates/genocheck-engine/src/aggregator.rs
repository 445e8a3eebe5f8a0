//! Run-scoped report aggregator
//!
//! One [`Aggregator`] is created per run and handed to every task. Clones
//! share the same append-only storage, so concurrent checks can emit without
//! coordinating with each other.

use genocheck_core::{CheckOutcome, Report, ReportEntry, Severity};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    entries: Vec<ReportEntry>,
    outcomes: Vec<CheckOutcome>,
}

/// Collects report entries and task outcomes for one run
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    state: Arc<RwLock<State>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    ///
    /// Entries carrying a filter sentinel (`ALL`/`NONE`) are rejected and
    /// `false` is returned.
    pub async fn record(&self, entry: ReportEntry) -> bool {
        if !entry.severity.is_emittable() {
            tracing::warn!(
                check = %entry.check,
                database = %entry.database,
                severity = %entry.severity,
                "rejected entry with sentinel severity"
            );
            return false;
        }

        self.state.write().await.entries.push(entry);
        true
    }

    /// Append the final outcome of one (database, check) task
    pub async fn record_outcome(&self, outcome: CheckOutcome) {
        self.state.write().await.outcomes.push(outcome);
    }

    /// Every entry, in emission order
    pub async fn entries(&self) -> Vec<ReportEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Entries at or above `min`
    pub async fn at_least(&self, min: Severity) -> Vec<ReportEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.severity >= min)
            .cloned()
            .collect()
    }

    /// Entries keyed by responsible team ("unassigned" when none)
    pub async fn by_team(&self) -> BTreeMap<String, Vec<ReportEntry>> {
        let state = self.state.read().await;
        let mut grouped: BTreeMap<String, Vec<ReportEntry>> = BTreeMap::new();
        for entry in &state.entries {
            let team = entry
                .team
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| "unassigned".to_string());
            grouped.entry(team).or_default().push(entry.clone());
        }
        grouped
    }

    /// Entries keyed by database name
    pub async fn by_database(&self) -> BTreeMap<String, Vec<ReportEntry>> {
        let state = self.state.read().await;
        let mut grouped: BTreeMap<String, Vec<ReportEntry>> = BTreeMap::new();
        for entry in &state.entries {
            grouped
                .entry(entry.database.name().to_string())
                .or_default()
                .push(entry.clone());
        }
        grouped
    }

    /// Entries emitted by one check
    pub async fn for_check(&self, check: &str) -> Vec<ReportEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.check == check)
            .cloned()
            .collect()
    }

    pub async fn outcomes(&self) -> Vec<CheckOutcome> {
        self.state.read().await.outcomes.clone()
    }

    /// Snapshot everything recorded so far as a report
    pub async fn report(&self) -> Report {
        let state = self.state.read().await;
        Report::from_parts(state.outcomes.clone(), state.entries.clone())
    }
}
