//! Gene-model checks (StableID, CanonicalTranscriptCoding) over SQLite fixtures

mod fixtures;

use fixtures::{core, human_core, run, run_with, TestDb, CORE_SQL};
use genocheck_core::{
    CheckStatus, Config, DatabaseIdentity, DatabaseKind, FindingCode, PrefixRule, Report,
    ReportEntry, Severity, Species, StandardCatalog,
};
use pretty_assertions::assert_eq;

fn status(report: &Report, check: &str) -> CheckStatus {
    report
        .outcomes
        .iter()
        .find(|o| o.check == check)
        .map(|o| o.status)
        .unwrap_or_else(|| panic!("{} did not run", check))
}

fn problems(report: &Report) -> Vec<&ReportEntry> {
    report.entries_at_least(Severity::Problem).collect()
}

fn messages(entries: &[&ReportEntry]) -> Vec<String> {
    entries.iter().map(|e| e.message.clone()).collect()
}

fn with(extra: &str) -> String {
    format!("{}{}", CORE_SQL, extra)
}

#[tokio::test]
async fn test_consistent_core_database_passes() {
    let db = TestDb::new(CORE_SQL);
    let report = run(&[db.target(human_core())], &["StableID", "CanonicalTranscriptCoding"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Passed);
    assert_eq!(status(&report, "CanonicalTranscriptCoding"), CheckStatus::Passed);
    assert!(problems(&report).is_empty(), "{:?}", messages(&problems(&report)));
}

// =============================================================================
// CanonicalTranscriptCoding
// =============================================================================

#[tokio::test]
async fn test_missing_canonical_transcript_is_one_problem_and_others_still_run() {
    let db = TestDb::new(&with("UPDATE gene SET canonical_transcript_id = NULL WHERE gene_id = 2;"));
    let report = run(&[db.target(human_core())], &["CanonicalTranscriptCoding"]).await;

    assert_eq!(status(&report, "CanonicalTranscriptCoding"), CheckStatus::Failed);
    assert_eq!(messages(&problems(&report)), vec!["1 genes do not have a canonical transcript"]);
    assert_eq!(report.summary.correct, 8);
}

#[tokio::test]
async fn test_non_canonical_translation_breaks_the_count() {
    let db = TestDb::new(&with(
        "INSERT INTO translation VALUES (200, 20, 'ENSP00000000200', 1, '2020-01-01', '2020-01-01');",
    ));
    let report = run(&[db.target(human_core())], &["CanonicalTranscriptCoding"]).await;

    let mismatch = report
        .entries
        .iter()
        .find(|e| e.message.starts_with("Number of canonical translations"))
        .unwrap();
    assert_eq!(mismatch.severity, Severity::Problem);
    assert_eq!(
        mismatch.message,
        "Number of canonical translations (1) is different from the total number of translations (2)"
    );
    assert_eq!(mismatch.expected.as_deref(), Some("2"));
    assert_eq!(mismatch.actual.as_deref(), Some("1"));
    assert!(messages(&problems(&report)).contains(&"1 genes with canonical transcripts have the wrong biotype".to_string()));
}

#[tokio::test]
async fn test_coding_gene_needs_coding_biotype() {
    let db = TestDb::new(&with("UPDATE gene SET biotype = 'pseudogene' WHERE gene_id = 1;"));
    let report = run(&[db.target(human_core())], &["CanonicalTranscriptCoding"]).await;

    assert!(messages(&problems(&report))
        .contains(&"1 genes with at least one protein_coding transcript do not have biotype protein_coding".to_string()));
}

// =============================================================================
// StableID
// =============================================================================

#[tokio::test]
async fn test_wrong_prefix_fails_but_lrg_is_exempt() {
    let db = TestDb::new(&with(
        "INSERT INTO gene VALUES
            (3, 'lncRNA', 20, 'LRG_1', 1, '2020-01-01', '2020-01-01'),
            (4, 'lncRNA', 20, 'XYZG00000000004', 1, '2020-01-01', '2020-01-01');",
    ));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    // Timestamps are fine, the earlier failure must survive
    assert_eq!(status(&report, "StableID"), CheckStatus::Failed);
    let problems = problems(&report);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, FindingCode::WrongPrefix);
    assert_eq!(problems[0].message, "1 rows in gene do not have the correct (ENSG) prefix");
}

#[tokio::test]
async fn test_null_and_duplicate_stable_ids() {
    let db = TestDb::new(&with(
        "INSERT INTO gene VALUES
            (3, 'lncRNA', 20, 'ENSG00000000001', 1, '2020-01-01', '2020-01-01'),
            (4, 'lncRNA', 20, NULL, 1, '2020-01-01', '2020-01-01');",
    ));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    let codes: Vec<_> = problems(&report).iter().map(|e| e.code).collect();
    assert_eq!(codes, vec![FindingCode::NullValues, FindingCode::DuplicateKeys]);
    assert_eq!(problems(&report)[1].actual.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_species_prefix_comes_from_the_catalog() {
    let db = TestDb::new(CORE_SQL);
    let mouse = core(Species::MusMusculus);

    let report = run(&[db.target(mouse.clone())], &["StableID"]).await;
    let wrong: Vec<_> = problems(&report).into_iter().filter(|e| e.code == FindingCode::WrongPrefix).collect();
    assert_eq!(wrong.len(), 4);

    let catalog = StandardCatalog::new().with_prefix(Species::MusMusculus, PrefixRule::Prefix("ENS".to_string()));
    let report = run_with(&Config::default(), catalog, &[db.target(mouse)], &["StableID"]).await;
    assert_eq!(status(&report, "StableID"), CheckStatus::Passed);
}

#[tokio::test]
async fn test_unknown_prefix_is_a_configuration_problem() {
    let db = TestDb::new(CORE_SQL);
    let report = run(&[db.target(core(Species::Unknown))], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Failed);
    let problems = problems(&report);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, FindingCode::MissingConfiguration);
    assert_eq!(report.summary.execution_errors, 0);
}

#[tokio::test]
async fn test_unknown_prefix_still_runs_later_assertions() {
    let db = TestDb::new(&with("UPDATE exon SET created_date = 0;"));
    let report = run(&[db.target(core(Species::Unknown))], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Failed);
    let codes: Vec<_> = problems(&report).iter().map(|e| e.code).collect();
    assert_eq!(codes, vec![FindingCode::MissingConfiguration, FindingCode::Assertion]);
    assert_eq!(
        problems(&report)[1].message,
        "1 rows in exon have created or modified dates of 0000-00-00 00:00:00"
    );
}

#[tokio::test]
async fn test_species_without_id_mapping_skip_only_prefixes() {
    let db = TestDb::new(CORE_SQL);
    let report = run(&[db.target(core(Species::CaenorhabditisElegans))], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Passed);
    assert!(!report.entries.iter().any(|e| e.code == FindingCode::WrongPrefix));

    let db = TestDb::new(&with("UPDATE exon SET created_date = 0;"));
    let report = run(&[db.target(core(Species::CaenorhabditisElegans))], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Failed);
    assert_eq!(
        messages(&problems(&report)),
        vec!["1 rows in exon have created or modified dates of 0000-00-00 00:00:00"]
    );
}

#[tokio::test]
async fn test_configured_ignore_keeps_timestamp_assertions() {
    let db = TestDb::new(&with("UPDATE exon SET created_date = 0;"));
    let catalog = StandardCatalog::new().with_prefix(Species::HomoSapiens, PrefixRule::Ignore);
    let report = run_with(&Config::default(), catalog, &[db.target(human_core())], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Failed);
    assert_eq!(
        messages(&problems(&report)),
        vec!["1 rows in exon have created or modified dates of 0000-00-00 00:00:00"]
    );
}

#[tokio::test]
async fn test_event_type_must_match_identifier() {
    let db = TestDb::new(&with(
        "INSERT INTO stable_id_event VALUES ('ENSG00000000002', 1, 'ENSG00000000002', 1, 1, 'transcript');",
    ));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    assert_eq!(
        messages(&problems(&report)),
        vec!["1 rows of type gene (prefix ENSG) in stable_id_event have identifiers that do not correspond to genes"]
    );
}

#[tokio::test]
async fn test_invalid_versions() {
    let db = TestDb::new(&with("UPDATE exon SET version = 0 WHERE exon_id = 1000;"));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    assert_eq!(messages(&problems(&report)), vec!["1 rows in exon have an invalid version"]);
}

#[tokio::test]
async fn test_versions_must_agree_with_latest_mapping_session() {
    let db = TestDb::new(&with("UPDATE stable_id_event SET new_version = 3 WHERE type = 'gene';"));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    assert_eq!(
        messages(&problems(&report)),
        vec!["1 gene versions disagree with stable_id_event for mapping session 2"]
    );
}

#[tokio::test]
async fn test_older_mapping_sessions_are_ignored() {
    let db = TestDb::new(&with(
        "INSERT INTO stable_id_event VALUES ('ENSG00000000001', 1, 'ENSG00000000001', 7, 1, 'gene');",
    ));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Passed);
}

#[tokio::test]
async fn test_no_mapping_session_is_info() {
    let db = TestDb::new(&with("DELETE FROM mapping_session;"));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Passed);
    assert!(report
        .entries
        .iter()
        .any(|e| e.severity == Severity::Info && e.message == "No mapping_session found"));
}

#[tokio::test]
async fn test_zero_timestamps() {
    let db = TestDb::new(&with("UPDATE translation SET modified_date = 0;"));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Failed);
    assert_eq!(
        messages(&problems(&report)),
        vec!["1 rows in translation have created or modified dates of 0000-00-00 00:00:00"]
    );
}

#[tokio::test]
async fn test_missing_event_table_errors_but_keeps_checking() {
    let db = TestDb::new(&with("DROP TABLE stable_id_event;"));
    let report = run(&[db.target(human_core())], &["StableID"]).await;

    assert_eq!(status(&report, "StableID"), CheckStatus::Error);
    assert!(report.entries.iter().any(|e| e.code == FindingCode::QueryFailed));
    assert!(report
        .entries
        .iter()
        .any(|e| e.message == "All entries in exon have valid created/modified timestamps"));
}

#[tokio::test]
async fn test_stable_id_skips_cdna_databases() {
    let db = TestDb::new(CORE_SQL);
    let cdna = DatabaseIdentity::new("homo_sapiens_cdna_110_38", Species::HomoSapiens, DatabaseKind::Cdna, 110);
    let report = run(&[db.target(cdna)], &["StableID"]).await;

    assert!(report.outcomes.is_empty());
    assert!(report.passed());
}
