//! Invariant primitives
//!
//! Reusable assertions over a check's session. Each one issues read-only
//! queries, records its findings through the context and returns whether
//! the invariant held. Query failures come back as `Err` so the calling
//! check decides whether to propagate or settle them.
//!
//! Table and column names are interpolated into SQL, so every identifier is
//! validated first.

use crate::context::CheckContext;
use crate::error::CheckError;
use genocheck_core::{FindingCode, Severity};
use genocheck_session::{DatabaseSession, SessionError, Value};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Number of offending keys quoted in an orphan finding
pub const ORPHAN_SAMPLE_SIZE: usize = 5;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("identifier pattern is valid")
    })
}

/// Accept `name` or `alias.name`; anything else is a configuration error
pub fn validate_identifier(identifier: &str) -> Result<&str, CheckError> {
    if identifier_pattern().is_match(identifier) {
        Ok(identifier)
    } else {
        Err(CheckError::InvalidIdentifier(identifier.to_string()))
    }
}

/// Bare column name; relation queries supply their own table aliases
fn validate_column(column: &str) -> Result<&str, CheckError> {
    let column = validate_identifier(column)?;
    if column.contains('.') {
        return Err(CheckError::InvalidIdentifier(column.to_string()));
    }
    Ok(column)
}

/// Two-column `key, count` aggregation as a map
///
/// NULL keys are collected under `"NULL"`; repeated keys are summed.
pub async fn counts_by_key(
    session: &dyn DatabaseSession,
    sql: &str,
) -> Result<BTreeMap<String, i64>, CheckError> {
    let rows = session.execute_rows(sql).await?;
    let mut counts = BTreeMap::new();

    for row in rows {
        let (key, count) = match row.as_slice() {
            [key, count, ..] => (key, count),
            _ => {
                return Err(SessionError::query(sql, "expected key and count columns").into());
            }
        };
        let count = match count {
            Value::Null => 0,
            other => other
                .as_i64()
                .ok_or_else(|| SessionError::query(sql, format!("expected an integer count, got {}", other)))?,
        };
        *counts.entry(key.to_string()).or_insert(0) += count;
    }

    Ok(counts)
}

struct Relation<'a> {
    child: &'a str,
    child_key: &'a str,
    parent: &'a str,
    parent_key: &'a str,
}

impl<'a> Relation<'a> {
    fn new(
        child: &'a str,
        child_key: &'a str,
        parent: &'a str,
        parent_key: &'a str,
    ) -> Result<Self, CheckError> {
        Ok(Self {
            child: validate_identifier(child)?,
            child_key: validate_column(child_key)?,
            parent: validate_identifier(parent)?,
            parent_key: validate_column(parent_key)?,
        })
    }

    /// Anti-join shared by the count and the sample query
    fn orphan_from(&self) -> String {
        format!(
            "FROM {child} child_rows LEFT JOIN {parent} parent_rows \
             ON child_rows.{ck} = parent_rows.{pk} \
             WHERE child_rows.{ck} IS NOT NULL AND parent_rows.{pk} IS NULL",
            child = self.child,
            parent = self.parent,
            ck = self.child_key,
            pk = self.parent_key,
        )
    }

    fn describe(&self) -> String {
        format!("{}.{} -> {}.{}", self.child, self.child_key, self.parent, self.parent_key)
    }
}

impl CheckContext {
    /// Whether `table` has at least one row
    pub async fn table_has_rows(&self, table: &str) -> Result<bool, CheckError> {
        let table = validate_identifier(table)?;
        let rows = self
            .session()
            .execute_rows(&format!("SELECT 1 FROM {} LIMIT 1", table))
            .await?;
        Ok(!rows.is_empty())
    }

    /// Single-value count query; NULL or no row counts as zero
    pub async fn get_row_count(&self, sql: &str) -> Result<i64, CheckError> {
        Ok(self.session().execute_count(sql).await?)
    }

    /// Grouped `key, count` query against this check's database
    pub async fn counts_by_key(&self, sql: &str) -> Result<BTreeMap<String, i64>, CheckError> {
        counts_by_key(self.session(), sql).await
    }

    /// Mandatory relation: every non-NULL child key must match a parent row
    ///
    /// Orphans are a PROBLEM with their count and a few sample keys. NULL
    /// keys are reported as a WARNING but do not fail the assertion.
    pub async fn check_for_orphans(
        &self,
        child: &str,
        child_key: &str,
        parent: &str,
        parent_key: &str,
    ) -> Result<bool, CheckError> {
        let relation = Relation::new(child, child_key, parent, parent_key)?;
        let held = self.orphan_assertion(&relation, FindingCode::OrphanRows).await?;

        let nulls = self
            .get_row_count(&format!(
                "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
                relation.child, relation.child_key
            ))
            .await?;
        if nulls > 0 {
            let entry = self
                .entry(
                    Severity::Warning,
                    FindingCode::NullForeignKey,
                    format!("{} rows in {} have a NULL {}", nulls, relation.child, relation.child_key),
                )
                .with_actual(nulls.to_string());
            self.record(entry).await;
        }

        Ok(held)
    }

    /// Optional relation: NULL child keys are valid and never counted
    pub async fn check_optional_relation(
        &self,
        child: &str,
        child_key: &str,
        parent: &str,
        parent_key: &str,
    ) -> Result<bool, CheckError> {
        let relation = Relation::new(child, child_key, parent, parent_key)?;
        self.orphan_assertion(&relation, FindingCode::OptionalRelation).await
    }

    async fn orphan_assertion(&self, relation: &Relation<'_>, code: FindingCode) -> Result<bool, CheckError> {
        let count = self
            .get_row_count(&format!("SELECT COUNT(*) {}", relation.orphan_from()))
            .await?;

        if count == 0 {
            self.correct(code, format!("No orphans in {}", relation.describe())).await;
            return Ok(true);
        }

        let samples = self
            .session()
            .execute_rows(&format!(
                "SELECT DISTINCT child_rows.{} {} LIMIT {}",
                relation.child_key,
                relation.orphan_from(),
                ORPHAN_SAMPLE_SIZE
            ))
            .await?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|value| value.to_string())
            .collect::<Vec<_>>();

        let entry = self
            .entry(
                Severity::Problem,
                code,
                format!(
                    "{} orphan rows in {} (e.g. {})",
                    count,
                    relation.describe(),
                    samples.join(", ")
                ),
            )
            .with_comparison("0", count.to_string());
        self.record(entry).await;
        Ok(false)
    }

    /// `key` must be unique across non-NULL values of `table`
    pub async fn check_duplicates(&self, table: &str, key: &str) -> Result<bool, CheckError> {
        let table = validate_identifier(table)?;
        let key = validate_identifier(key)?;

        let duplicates = self
            .get_row_count(&format!(
                "SELECT COUNT({key}) - COUNT(DISTINCT {key}) FROM {table}",
                key = key,
                table = table
            ))
            .await?;

        if duplicates > 0 {
            let entry = self
                .entry(
                    Severity::Problem,
                    FindingCode::DuplicateKeys,
                    format!("{} has {} duplicate {} values", table, duplicates, key),
                )
                .with_comparison("0", duplicates.to_string());
            self.record(entry).await;
            Ok(false)
        } else {
            self.correct(FindingCode::DuplicateKeys, format!("No duplicate {} values in {}", key, table))
                .await;
            Ok(true)
        }
    }

    /// `column` of `table` must never be NULL
    pub async fn check_no_nulls(&self, table: &str, column: &str) -> Result<bool, CheckError> {
        let table = validate_identifier(table)?;
        let column = validate_identifier(column)?;

        let nulls = self
            .get_row_count(&format!("SELECT COUNT(*) FROM {} WHERE {} IS NULL", table, column))
            .await?;

        if nulls > 0 {
            let entry = self
                .entry(
                    Severity::Problem,
                    FindingCode::NullValues,
                    format!("{} rows in {} have a NULL {}", nulls, table, column),
                )
                .with_comparison("0", nulls.to_string());
            self.record(entry).await;
            Ok(false)
        } else {
            self.correct(FindingCode::NullValues, format!("No NULL {} values in {}", column, table))
                .await;
            Ok(true)
        }
    }

    /// Count query that must return zero
    ///
    /// On failure the message is prefixed with the count, e.g.
    /// `assert_zero(code, sql, "genes lack a canonical transcript", ...)`
    /// records "12 genes lack a canonical transcript".
    pub async fn assert_zero(
        &self,
        code: FindingCode,
        sql: &str,
        problem: &str,
        correct: &str,
    ) -> Result<bool, CheckError> {
        let count = self.get_row_count(sql).await?;

        if count > 0 {
            let entry = self
                .entry(Severity::Problem, code, format!("{} {}", count, problem))
                .with_comparison("0", count.to_string());
            self.record(entry).await;
            Ok(false)
        } else {
            self.correct(code, correct).await;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genocheck_session::MockSession;

    #[test]
    fn identifier_validation() {
        assert!(validate_identifier("gene").is_ok());
        assert!(validate_identifier("_tmp2").is_ok());
        assert!(validate_identifier("g.stable_id").is_ok());
        assert!(validate_identifier("2gene").is_err());
        assert!(validate_identifier("gene; DROP TABLE gene").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[tokio::test]
    async fn counts_by_key_sums_and_keeps_null_keys() {
        let mock = MockSession::new();
        mock.add_rows(
            "SELECT db_name, COUNT(*) FROM x GROUP BY db_name",
            vec![
                vec![Value::Text("GO".to_string()), Value::Int(10)],
                vec![Value::Null, Value::Int(2)],
                vec![Value::Text("GO".to_string()), Value::Text("5".to_string())],
            ],
        )
        .await;

        let counts = counts_by_key(&mock, "SELECT db_name, COUNT(*) FROM x GROUP BY db_name")
            .await
            .unwrap();
        assert_eq!(counts["GO"], 15);
        assert_eq!(counts["NULL"], 2);
    }

    #[tokio::test]
    async fn counts_by_key_rejects_single_column() {
        let mock = MockSession::new();
        mock.add_rows("SELECT 1", vec![vec![Value::Int(1)]]).await;
        assert!(counts_by_key(&mock, "SELECT 1").await.is_err());
    }
}
