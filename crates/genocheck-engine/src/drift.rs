//! Release-to-release count drift
//!
//! Compares grouped counts (e.g. xrefs per external database) between a
//! database and its previous release. A category whose count fell below a
//! fraction of its previous value is a PROBLEM.
//!
//! The comparison itself is pure ([`compare_counts`]); [`DriftCheck`] wires
//! it to the two databases for any [`CountComparison`].

use crate::check::Check;
use crate::context::CheckContext;
use crate::error::CheckError;
use crate::primitives::counts_by_key;
use async_trait::async_trait;
use genocheck_core::{CheckMetadata, DatabaseIdentity, FindingCode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which count goes on top of the ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioDirection {
    /// `current / previous`: flags categories that shrank
    CurrentOverPrevious,

    /// `previous / current`: flags categories that grew
    PreviousOverCurrent,
}

impl Default for RatioDirection {
    fn default() -> Self {
        Self::CurrentOverPrevious
    }
}

/// Outcome for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftVerdict {
    /// Ratio at or above the threshold, or no ratio to compute
    Within,

    /// Ratio below the threshold
    BelowThreshold,

    /// Present before, absent (or zero) now
    Vanished,

    /// Present now, absent before
    New,
}

impl DriftVerdict {
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::BelowThreshold | Self::Vanished)
    }
}

/// Comparison of one key across releases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdComparisonRecord {
    pub key: String,

    pub previous: i64,

    pub current: i64,

    /// `None` when the denominator is zero
    pub ratio: Option<f64>,

    pub verdict: DriftVerdict,
}

/// Compare previous and current counts key by key
///
/// Records for previous keys come first (in key order), then keys only
/// present now.
pub fn compare_counts(
    previous: &BTreeMap<String, i64>,
    current: &BTreeMap<String, i64>,
    threshold: f64,
    direction: RatioDirection,
) -> Vec<ThresholdComparisonRecord> {
    let mut records = Vec::with_capacity(previous.len() + current.len());

    for (key, &prev) in previous {
        let cur = current.get(key).copied().unwrap_or(0);

        // Nothing to lose if there was nothing before
        if prev <= 0 {
            records.push(ThresholdComparisonRecord {
                key: key.clone(),
                previous: prev,
                current: cur,
                ratio: None,
                verdict: DriftVerdict::Within,
            });
            continue;
        }

        if cur <= 0 {
            records.push(ThresholdComparisonRecord {
                key: key.clone(),
                previous: prev,
                current: cur,
                ratio: match direction {
                    RatioDirection::CurrentOverPrevious => Some(0.0),
                    RatioDirection::PreviousOverCurrent => None,
                },
                verdict: DriftVerdict::Vanished,
            });
            continue;
        }

        let ratio = match direction {
            RatioDirection::CurrentOverPrevious => cur as f64 / prev as f64,
            RatioDirection::PreviousOverCurrent => prev as f64 / cur as f64,
        };
        let verdict = if ratio < threshold {
            DriftVerdict::BelowThreshold
        } else {
            DriftVerdict::Within
        };

        records.push(ThresholdComparisonRecord {
            key: key.clone(),
            previous: prev,
            current: cur,
            ratio: Some(ratio),
            verdict,
        });
    }

    for (key, &cur) in current {
        if !previous.contains_key(key) {
            records.push(ThresholdComparisonRecord {
                key: key.clone(),
                previous: 0,
                current: cur,
                ratio: None,
                verdict: DriftVerdict::New,
            });
        }
    }

    records
}

/// A grouped count compared against the previous release
pub trait CountComparison: Send + Sync {
    fn metadata(&self) -> &CheckMetadata;

    /// What is being counted, for messages (e.g. "xrefs")
    fn subject(&self) -> &str;

    /// Two-column `key, count` query for a database of this schema version
    fn counts_sql(&self, db: &DatabaseIdentity) -> String;

    /// Minimum acceptable ratio
    fn threshold(&self) -> f64;

    fn direction(&self) -> RatioDirection {
        RatioDirection::CurrentOverPrevious
    }
}

/// Runs a [`CountComparison`] against a database and its previous release
pub struct DriftCheck<C> {
    comparison: C,
}

impl<C: CountComparison> DriftCheck<C> {
    pub fn new(comparison: C) -> Self {
        Self { comparison }
    }

    pub fn comparison(&self) -> &C {
        &self.comparison
    }
}

#[async_trait]
impl<C: CountComparison> Check for DriftCheck<C> {
    fn metadata(&self) -> &CheckMetadata {
        self.comparison.metadata()
    }

    async fn run(&self, ctx: &mut CheckContext) -> Result<bool, CheckError> {
        let subject = self.comparison.subject();

        let Some((previous_identity, previous_session)) = ctx.open_previous().await? else {
            ctx.info(
                FindingCode::NoPreviousRelease,
                format!("No previous release registered for {}; {} not compared", ctx.identity(), subject),
            )
            .await;
            return Ok(true);
        };

        let current = ctx.counts_by_key(&self.comparison.counts_sql(ctx.identity())).await?;
        let previous = counts_by_key(
            previous_session.as_ref(),
            &self.comparison.counts_sql(&previous_identity),
        )
        .await?;

        let threshold = self.comparison.threshold();
        let records = compare_counts(&previous, &current, threshold, self.comparison.direction());

        tracing::debug!(
            check = ctx.check_name(),
            database = %ctx.identity(),
            previous = %previous_identity,
            keys = records.len(),
            "compared counts"
        );

        let mut result = true;
        for record in &records {
            let entry = match record.verdict {
                DriftVerdict::Within => ctx.entry(
                    Severity::Correct,
                    FindingCode::CountDrift,
                    format!("{} {}: {} now, {} in {}", subject, record.key, record.current, record.previous, previous_identity),
                ),
                DriftVerdict::BelowThreshold => ctx.entry(
                    Severity::Problem,
                    FindingCode::CountDrift,
                    format!(
                        "{} {}: {} now, {} in {} (ratio {:.2} below threshold {:.2})",
                        subject,
                        record.key,
                        record.current,
                        record.previous,
                        previous_identity,
                        record.ratio.unwrap_or_default(),
                        threshold
                    ),
                ),
                DriftVerdict::Vanished => ctx.entry(
                    Severity::Problem,
                    FindingCode::CountDrift,
                    format!(
                        "{} {}: none now, {} in {}",
                        subject, record.key, record.previous, previous_identity
                    ),
                ),
                DriftVerdict::New => ctx.entry(
                    Severity::Info,
                    FindingCode::NewCategory,
                    format!("{} {}: {} now, not present in {}", subject, record.key, record.current, previous_identity),
                ),
            }
            .with_comparison(record.previous.to_string(), record.current.to_string());

            ctx.record(entry).await;
            result &= !record.verdict.is_violation();
        }

        Ok(result)
    }
}
