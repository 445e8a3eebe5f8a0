//! Test fixtures for session integration tests
//!
//! Small SQLite databases shaped like annotation databases, written to a
//! temporary directory.

use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Gene and transcript tables with a handful of rows
pub const CORE_SQL: &str = "
CREATE TABLE gene (
    gene_id INTEGER PRIMARY KEY,
    stable_id TEXT,
    biotype TEXT NOT NULL,
    canonical_transcript_id INTEGER
);
CREATE TABLE transcript (
    transcript_id INTEGER PRIMARY KEY,
    gene_id INTEGER,
    stable_id TEXT,
    biotype TEXT NOT NULL
);
INSERT INTO gene VALUES
    (1, 'ENSG00000000001', 'protein_coding', 11),
    (2, 'ENSG00000000002', 'lncRNA', 21),
    (3, NULL, 'protein_coding', 31);
INSERT INTO transcript VALUES
    (11, 1, 'ENST00000000011', 'protein_coding'),
    (21, 2, 'ENST00000000021', 'lncRNA'),
    (31, 3, 'ENST00000000031', 'protein_coding');
";

/// Create a database file from a SQL script
pub fn create_db(dir: &Path, file_name: &str, sql: &str) -> PathBuf {
    let path = dir.join(file_name);
    let conn = Connection::open(&path).expect("create fixture database");
    conn.execute_batch(sql).expect("seed fixture database");
    path
}

/// A core-like database in `dir`
pub fn core_db(dir: &Path) -> PathBuf {
    create_db(dir, "homo_sapiens_core_110_38.sqlite", CORE_SQL)
}
