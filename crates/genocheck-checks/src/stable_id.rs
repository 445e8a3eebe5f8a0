//! Stable identifier validity for gene-model databases

use async_trait::async_trait;
use genocheck_core::{CheckMetadata, DatabaseKind, FindingCode, PrefixRule, Priority, Severity, Team};
use genocheck_engine::{validate_identifier, Check, CheckContext, CheckError};

/// Tables carrying stable identifiers, with the letter that follows the
/// species prefix
const STABLE_ID_TYPES: [(&str, char); 4] = [
    ("gene", 'G'),
    ("transcript", 'T'),
    ("translation", 'P'),
    ("exon", 'E'),
];

pub struct StableIdCheck {
    metadata: CheckMetadata,
}

impl StableIdCheck {
    pub fn new() -> Self {
        Self {
            metadata: CheckMetadata::builder("StableID")
                .description("Checks stable_id data is valid.")
                .group("post_genebuild")
                .group("pre-compara-handover")
                .group("post-compara-handover")
                .group("post-projection")
                .team(Team::Core)
                .team(Team::Genebuild)
                .priority(Priority::Red)
                .effect("Compara will have invalid stable IDs.")
                .fix("Re-run stable ID mapping or fix manually.")
                .without_kind(DatabaseKind::Cdna)
                .build(),
        }
    }

    async fn check_prefixes(&self, ctx: &CheckContext, prefix: &str) -> Result<bool, CheckError> {
        let prefix = validate_identifier(prefix)?;
        let mut result = true;

        for (table, letter) in STABLE_ID_TYPES {
            let expected = format!("{}{}", prefix, letter);
            result &= ctx
                .assert_zero(
                    FindingCode::WrongPrefix,
                    &format!(
                        "SELECT COUNT(*) FROM {} WHERE stable_id NOT LIKE '{}%' AND stable_id NOT LIKE 'LRG%'",
                        table, expected
                    ),
                    &format!("rows in {} do not have the correct ({}) prefix", table, expected),
                    &format!("All rows in {} have the correct prefix ({})", table, expected),
                )
                .await?;
        }

        Ok(result)
    }

    /// Prefix of the first identifier in `table`, digits and all after them dropped
    async fn observed_prefix(&self, ctx: &CheckContext, table: &str) -> Result<Option<String>, CheckError> {
        let first = ctx
            .session()
            .execute_scalar(&format!("SELECT stable_id FROM {} LIMIT 1", table))
            .await?;

        let prefix: Option<String> = first
            .as_ref()
            .and_then(|value| value.as_str())
            .map(|id| id.chars().take_while(|c| !c.is_ascii_digit()).collect());

        match prefix {
            Some(prefix) if !prefix.is_empty() => Ok(Some(validate_identifier(&prefix)?.to_string())),
            _ => Ok(None),
        }
    }

    async fn check_event_type(&self, ctx: &CheckContext, table: &str) -> Result<bool, CheckError> {
        let Some(prefix) = self.observed_prefix(ctx, table).await? else {
            ctx.info(
                FindingCode::EmptyTable,
                format!("Can't get a stable ID prefix for {} from its first row", table),
            )
            .await;
            return Ok(true);
        };

        let count = ctx
            .get_row_count(&format!(
                "SELECT COUNT(*) FROM stable_id_event WHERE (old_stable_id LIKE '{p}%' OR new_stable_id LIKE '{p}%') AND type != '{t}'",
                p = prefix,
                t = table
            ))
            .await?;

        if count > 0 {
            let entry = ctx
                .entry(
                    Severity::Problem,
                    FindingCode::Assertion,
                    format!(
                        "{} rows of type {} (prefix {}) in stable_id_event have identifiers that do not correspond to {}s",
                        count, table, prefix, table
                    ),
                )
                .with_comparison("0", count.to_string());
            ctx.record(entry).await;
            Ok(false)
        } else {
            ctx.correct(
                FindingCode::Assertion,
                format!("All {} types in stable_id_event correspond to identifiers", table),
            )
            .await;
            Ok(true)
        }
    }

    async fn check_versions(&self, ctx: &CheckContext, table: &str) -> Result<bool, CheckError> {
        ctx.assert_zero(
            FindingCode::Assertion,
            &format!("SELECT COUNT(*) FROM {} WHERE version < 1 OR version IS NULL", table),
            &format!("rows in {} have an invalid version", table),
            &format!("All versions in {} are valid", table),
        )
        .await
    }

    /// Newest `mapping_session`, if any
    async fn latest_mapping_session(&self, ctx: &CheckContext) -> Result<Option<i64>, CheckError> {
        let sql = "SELECT mapping_session_id FROM mapping_session ORDER BY created DESC LIMIT 1";
        let value = ctx.session().execute_scalar(sql).await?;
        Ok(value.and_then(|v| v.as_i64()))
    }

    async fn check_mapped_versions(&self, ctx: &CheckContext, table: &str, session_id: i64) -> Result<bool, CheckError> {
        ctx.assert_zero(
            FindingCode::Assertion,
            &format!(
                "SELECT COUNT(*) FROM stable_id_event sie, {} si WHERE sie.mapping_session_id = {} AND sie.new_stable_id = si.stable_id AND sie.new_version <> si.version",
                table, session_id
            ),
            &format!("{} versions disagree with stable_id_event for mapping session {}", table, session_id),
            &format!("{} versions agree with stable_id_event for mapping session {}", table, session_id),
        )
        .await
    }

    async fn check_timestamps(&self, ctx: &CheckContext, table: &str) -> Result<bool, CheckError> {
        ctx.assert_zero(
            FindingCode::Assertion,
            &format!("SELECT COUNT(*) FROM {} WHERE created_date=0 OR modified_date=0", table),
            &format!("rows in {} have created or modified dates of 0000-00-00 00:00:00", table),
            &format!("All entries in {} have valid created/modified timestamps", table),
        )
        .await
    }
}

impl Default for StableIdCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for StableIdCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    async fn run(&self, ctx: &mut CheckContext) -> Result<bool, CheckError> {
        let mut result = true;

        for (table, _) in STABLE_ID_TYPES {
            let nulls = ctx.check_no_nulls(table, "stable_id").await;
            result &= ctx.settle(nulls).await;
            let duplicates = ctx.check_duplicates(table, "stable_id").await;
            result &= ctx.settle(duplicates).await;
        }

        // Prefixes only mean something in core databases
        if ctx.identity().kind() != DatabaseKind::Core {
            return Ok(result);
        }

        let identity = ctx.identity().clone();
        let rule = ctx.catalog().stable_id_prefix(identity.species(), identity.kind());
        match rule {
            None => {
                ctx.configuration_problem(format!(
                    "Can't get stable ID prefix for {}; add it to the prefix table",
                    identity.species()
                ))
                .await;
                result = false;
            }
            Some(PrefixRule::Ignore) => {
                tracing::debug!(database = %identity, "stable ID prefixes not checked for this species");
            }
            Some(PrefixRule::Prefix(prefix)) => {
                let prefixes = self.check_prefixes(ctx, &prefix).await;
                result &= ctx.settle(prefixes).await;
            }
        }

        for (table, _) in STABLE_ID_TYPES {
            let types = self.check_event_type(ctx, table).await;
            result &= ctx.settle(types).await;
            let versions = self.check_versions(ctx, table).await;
            result &= ctx.settle(versions).await;
        }

        match self.latest_mapping_session(ctx).await {
            Ok(Some(session_id)) => {
                for (table, _) in STABLE_ID_TYPES {
                    let mapped = self.check_mapped_versions(ctx, table, session_id).await;
                    result &= ctx.settle(mapped).await;
                }
            }
            Ok(None) => ctx.info(FindingCode::EmptyTable, "No mapping_session found").await,
            Err(err) => result &= ctx.settle(Err(err)).await,
        }

        for (table, _) in STABLE_ID_TYPES {
            let timestamps = self.check_timestamps(ctx, table).await;
            result &= ctx.settle(timestamps).await;
        }

        Ok(result)
    }
}
