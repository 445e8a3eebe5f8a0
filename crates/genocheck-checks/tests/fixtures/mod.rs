//! Test fixtures for the check catalog
//!
//! Small but schema-faithful gene-model and Compara databases in SQLite,
//! and a helper that runs the shipped registry over them.

#![allow(dead_code)]

use genocheck_core::{
    Config, DatabaseIdentity, DatabaseKind, GroupSelection, MetadataCatalog, Report, Species,
    StandardCatalog,
};
use genocheck_engine::{CheckRunner, DatabaseTarget, PreviousDatabase};
use genocheck_session::SqliteConnector;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A seeded SQLite database that lives as long as the fixture
pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn new(sql: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("db.sqlite");
        Connection::open(&path)
            .expect("create database")
            .execute_batch(sql)
            .expect("seed database");
        Self { _dir: dir, path }
    }

    pub fn target(&self, identity: DatabaseIdentity) -> DatabaseTarget {
        DatabaseTarget::new(identity, Arc::new(SqliteConnector::new(self.path.clone())))
    }

    pub fn as_previous(&self, identity: DatabaseIdentity) -> PreviousDatabase {
        PreviousDatabase::new(identity, Arc::new(SqliteConnector::new(self.path.clone())))
    }
}

pub fn core(species: Species) -> DatabaseIdentity {
    DatabaseIdentity::new(
        format!("{}_core_110_1", species.as_str()),
        species,
        DatabaseKind::Core,
        110,
    )
}

pub fn human_core() -> DatabaseIdentity {
    core(Species::HomoSapiens)
}

pub fn compara() -> DatabaseIdentity {
    DatabaseIdentity::new("ensembl_compara_110", Species::Unknown, DatabaseKind::Compara, 110)
}

/// Run the shipped registry for `groups` over `targets`
pub async fn run(targets: &[DatabaseTarget], groups: &[&str]) -> Report {
    run_with(&Config::default(), StandardCatalog::new(), targets, groups).await
}

pub async fn run_with(
    config: &Config,
    catalog: impl MetadataCatalog + 'static,
    targets: &[DatabaseTarget],
    groups: &[&str],
) -> Report {
    let registry = genocheck_checks::registry(config).expect("build registry");
    CheckRunner::new(Arc::new(registry), Arc::new(catalog))
        .run(targets, &GroupSelection::new(groups.iter().copied()))
        .await
}

/// Gene-model schema with one coding and one non-coding gene, all consistent
pub const CORE_SQL: &str = "
CREATE TABLE gene (
    gene_id INTEGER PRIMARY KEY,
    biotype TEXT NOT NULL,
    canonical_transcript_id INTEGER,
    stable_id TEXT,
    version INTEGER,
    created_date DATETIME,
    modified_date DATETIME
);
CREATE TABLE transcript (
    transcript_id INTEGER PRIMARY KEY,
    gene_id INTEGER,
    biotype TEXT NOT NULL,
    canonical_translation_id INTEGER,
    stable_id TEXT,
    version INTEGER,
    created_date DATETIME,
    modified_date DATETIME
);
CREATE TABLE translation (
    translation_id INTEGER PRIMARY KEY,
    transcript_id INTEGER NOT NULL,
    stable_id TEXT,
    version INTEGER,
    created_date DATETIME,
    modified_date DATETIME
);
CREATE TABLE exon (
    exon_id INTEGER PRIMARY KEY,
    stable_id TEXT,
    version INTEGER,
    created_date DATETIME,
    modified_date DATETIME
);
CREATE TABLE mapping_session (mapping_session_id INTEGER PRIMARY KEY, created DATETIME);
CREATE TABLE stable_id_event (
    old_stable_id TEXT,
    old_version INTEGER,
    new_stable_id TEXT,
    new_version INTEGER,
    mapping_session_id INTEGER,
    type TEXT
);

INSERT INTO gene VALUES
    (1, 'protein_coding', 10, 'ENSG00000000001', 1, '2020-01-01', '2020-01-01'),
    (2, 'lncRNA', 20, 'ENSG00000000002', 1, '2020-01-01', '2020-01-01');
INSERT INTO transcript VALUES
    (10, 1, 'protein_coding', 100, 'ENST00000000010', 1, '2020-01-01', '2020-01-01'),
    (20, 2, 'lncRNA', NULL, 'ENST00000000020', 1, '2020-01-01', '2020-01-01');
INSERT INTO translation VALUES
    (100, 10, 'ENSP00000000100', 1, '2020-01-01', '2020-01-01');
INSERT INTO exon VALUES
    (1000, 'ENSE00000001000', 1, '2020-01-01', '2020-01-01'),
    (1001, 'ENSE00000001001', 2, '2020-01-01', '2020-01-01');
INSERT INTO mapping_session VALUES (1, '2019-01-01'), (2, '2020-01-01');
INSERT INTO stable_id_event VALUES
    ('ENSG00000000001', 1, 'ENSG00000000001', 1, 2, 'gene'),
    ('ENST00000000010', 1, 'ENST00000000010', 1, 2, 'transcript'),
    ('ENSE00000001001', 1, 'ENSE00000001001', 2, 2, 'exon');
";

/// Compara tables touched by the foreign-key checks, all references intact
pub const COMPARA_SQL: &str = "
CREATE TABLE genomic_align_block (genomic_align_block_id INTEGER PRIMARY KEY);
CREATE TABLE genomic_align (genomic_align_id INTEGER PRIMARY KEY, genomic_align_block_id INTEGER);
CREATE TABLE conservation_score (genomic_align_block_id INTEGER, window_size INTEGER);

CREATE TABLE gene_member (gene_member_id INTEGER PRIMARY KEY);
CREATE TABLE seq_member (seq_member_id INTEGER PRIMARY KEY, gene_member_id INTEGER);
CREATE TABLE family_member (family_id INTEGER, seq_member_id INTEGER);
CREATE TABLE homology_member (homology_id INTEGER, seq_member_id INTEGER, gene_member_id INTEGER);
CREATE TABLE gene_align_member (gene_align_id INTEGER, seq_member_id INTEGER);
CREATE TABLE other_member_sequence (seq_member_id INTEGER, seq_type TEXT);
CREATE TABLE gene_tree_node (node_id INTEGER PRIMARY KEY, seq_member_id INTEGER);
CREATE TABLE member_xref (gene_member_id INTEGER, dbprimary_acc TEXT);

INSERT INTO genomic_align_block VALUES (1), (2);
INSERT INTO genomic_align VALUES (11, 1), (12, 1), (21, 2);

INSERT INTO gene_member VALUES (100), (200);
INSERT INTO seq_member VALUES (1, 100), (2, 200), (3, NULL);
INSERT INTO family_member VALUES (7, 1), (7, 2);
INSERT INTO homology_member VALUES (5, 1, 100), (5, 2, 200);
INSERT INTO gene_align_member VALUES (9, 1), (9, 2);
INSERT INTO other_member_sequence VALUES (1, 'cds'), (2, 'cds');
INSERT INTO gene_tree_node VALUES (1, NULL), (2, 1), (3, 2);
INSERT INTO member_xref VALUES (100, 'GO:0005515');
";

/// Xref schema plus `counts` xrefs per external database
///
/// `projected` extra xrefs are added to the first database, marked as
/// projections both ways the schema history has used.
pub fn xref_sql(counts: &[(&str, usize)], projected: usize) -> String {
    let mut sql = String::from(
        "CREATE TABLE external_db (external_db_id INTEGER PRIMARY KEY, db_name TEXT);
         CREATE TABLE xref (xref_id INTEGER PRIMARY KEY, external_db_id INTEGER, display_label TEXT, info_type TEXT);
         CREATE TABLE object_xref (object_xref_id INTEGER PRIMARY KEY, xref_id INTEGER);",
    );

    let mut xref_id = 0;
    for (db_id, (db_name, count)) in counts.iter().enumerate() {
        sql.push_str(&format!("INSERT INTO external_db VALUES ({}, '{}');", db_id, db_name));
        for _ in 0..*count {
            xref_id += 1;
            sql.push_str(&format!(
                "INSERT INTO xref VALUES ({id}, {db}, 'label{id}', NULL); INSERT INTO object_xref VALUES ({id}, {id});",
                id = xref_id,
                db = db_id
            ));
        }
    }

    for _ in 0..projected {
        xref_id += 1;
        sql.push_str(&format!(
            "INSERT INTO xref VALUES ({id}, 0, 'label{id} [from homo_sapiens]', 'PROJECTION'); INSERT INTO object_xref VALUES ({id}, {id});",
            id = xref_id
        ));
    }

    sql
}
