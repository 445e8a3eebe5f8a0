//! Xref drift between two releases of a core database

mod fixtures;

use fixtures::{human_core, run, run_with, xref_sql, TestDb};
use genocheck_core::{
    CheckStatus, Config, DatabaseIdentity, DatabaseKind, FindingCode, Severity, Species,
    StandardCatalog,
};
use pretty_assertions::assert_eq;

fn previous_release(version: u32) -> DatabaseIdentity {
    DatabaseIdentity::new(
        format!("homo_sapiens_core_{}_38", version),
        Species::HomoSapiens,
        DatabaseKind::Core,
        version,
    )
}

#[tokio::test]
async fn test_small_loss_passes() {
    let previous = TestDb::new(&xref_sql(&[("GO", 100), ("UniProt", 50)], 0));
    let current = TestDb::new(&xref_sql(&[("GO", 80), ("UniProt", 50)], 0));

    let target = current
        .target(human_core())
        .with_previous(previous.as_previous(previous_release(109)));
    let report = run(&[target], &["core_xrefs"]).await;

    assert_eq!(report.outcomes[0].status, CheckStatus::Passed);
    assert_eq!(report.summary.correct, 2);
}

#[tokio::test]
async fn test_large_loss_is_one_problem() {
    let previous = TestDb::new(&xref_sql(&[("GO", 100), ("UniProt", 50)], 0));
    let current = TestDb::new(&xref_sql(&[("GO", 70), ("UniProt", 50)], 0));

    let target = current
        .target(human_core())
        .with_previous(previous.as_previous(previous_release(109)));
    let report = run(&[target], &["core_xrefs"]).await;

    assert_eq!(report.outcomes[0].status, CheckStatus::Failed);
    let problems: Vec<_> = report.entries_at_least(Severity::Problem).collect();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, FindingCode::CountDrift);
    assert!(problems[0].message.starts_with("xrefs GO: 70 now, 100 in homo_sapiens_core_109_38"));
}

#[tokio::test]
async fn test_projected_xrefs_do_not_count() {
    let previous = TestDb::new(&xref_sql(&[("GO", 100)], 0));
    // 70 real GO xrefs plus 50 projections would pass if projections counted
    let current = TestDb::new(&xref_sql(&[("GO", 70)], 50));

    let target = current
        .target(human_core())
        .with_previous(previous.as_previous(previous_release(109)));
    let report = run(&[target], &["core_xrefs"]).await;

    assert_eq!(report.outcomes[0].status, CheckStatus::Failed);
    assert_eq!(report.entries_at_least(Severity::Problem).next().unwrap().actual.as_deref(), Some("70"));
}

#[tokio::test]
async fn test_old_schema_filters_projections_by_label() {
    // Schema 37 marks projections in the display label only
    let previous = TestDb::new(&xref_sql(&[("GO", 100)], 40));
    let current = TestDb::new(&xref_sql(&[("GO", 90)], 0));

    let target = current
        .target(human_core())
        .with_previous(previous.as_previous(previous_release(37)));
    let report = run(&[target], &["core_xrefs"]).await;

    assert_eq!(report.outcomes[0].status, CheckStatus::Passed);
    let entry = &report.entries[0];
    assert_eq!(entry.expected.as_deref(), Some("100"));
    assert_eq!(entry.actual.as_deref(), Some("90"));
}

#[tokio::test]
async fn test_vanished_database_fails_and_new_one_is_info() {
    let previous = TestDb::new(&xref_sql(&[("GO", 100), ("RefSeq", 10)], 0));
    let current = TestDb::new(&xref_sql(&[("GO", 100), ("Reactome", 5)], 0));

    let target = current
        .target(human_core())
        .with_previous(previous.as_previous(previous_release(109)));
    let report = run(&[target], &["core_xrefs"]).await;

    let by_code = |code: FindingCode| report.entries.iter().filter(|e| e.code == code).count();
    assert_eq!(report.outcomes[0].status, CheckStatus::Failed);
    assert_eq!(by_code(FindingCode::NewCategory), 1);
    let problems: Vec<_> = report.entries_at_least(Severity::Problem).collect();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.starts_with("xrefs RefSeq: none now"));
}

#[tokio::test]
async fn test_configured_threshold_overrides_default() {
    let previous = TestDb::new(&xref_sql(&[("GO", 100)], 0));
    let current = TestDb::new(&xref_sql(&[("GO", 70)], 0));

    let mut config = Config::default();
    config.set_threshold("ComparePreviousVersionXrefs", 0.6);

    let target = current
        .target(human_core())
        .with_previous(previous.as_previous(previous_release(109)));
    let report = run_with(&config, StandardCatalog::new(), &[target], &["core_xrefs"]).await;

    assert_eq!(report.outcomes[0].status, CheckStatus::Passed);
}

#[tokio::test]
async fn test_first_release_has_nothing_to_compare() {
    let current = TestDb::new(&xref_sql(&[("GO", 70)], 0));
    let report = run(&[current.target(human_core())], &["core_xrefs"]).await;

    assert_eq!(report.outcomes[0].status, CheckStatus::Passed);
    assert_eq!(report.entries[0].code, FindingCode::NoPreviousRelease);
}
