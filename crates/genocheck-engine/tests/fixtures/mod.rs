//! Test fixtures for engine integration tests
//!
//! SQLite databases seeded from SQL scripts in a temporary directory, and
//! check contexts opened over them.

#![allow(dead_code)]

use genocheck_core::{CheckMetadata, DatabaseIdentity, DatabaseKind, Species, StandardCatalog, Team};
use genocheck_engine::{Aggregator, CheckContext};
use genocheck_session::SqliteSession;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A seeded database file that lives as long as the fixture
pub struct Fixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    pub fn new(sql: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("fixture.sqlite");
        Connection::open(&path)
            .expect("create fixture database")
            .execute_batch(sql)
            .expect("seed fixture database");
        Self { _dir: dir, path }
    }

    /// Context for a check named `check` over this database
    pub fn context(&self, check: &str, aggregator: &Aggregator) -> CheckContext {
        let metadata = CheckMetadata::builder(check).team(Team::Compara).build();
        let session = SqliteSession::open(&self.path).expect("open fixture database");
        CheckContext::new(
            &metadata,
            compara_identity(),
            Box::new(session),
            Arc::new(StandardCatalog::new()),
            aggregator.clone(),
        )
    }
}

pub fn compara_identity() -> DatabaseIdentity {
    DatabaseIdentity::new("ensembl_compara_110", Species::Unknown, DatabaseKind::Compara, 110)
}

pub fn core_identity(name: &str) -> DatabaseIdentity {
    DatabaseIdentity::new(name, Species::HomoSapiens, DatabaseKind::Core, 110)
}

/// Parent and child tables where every child key resolves
pub const MEMBERS_SQL: &str = "
CREATE TABLE seq_member (seq_member_id INTEGER PRIMARY KEY, gene_member_id INTEGER);
CREATE TABLE gene_member (gene_member_id INTEGER PRIMARY KEY);
CREATE TABLE homology_member (homology_id INTEGER, seq_member_id INTEGER);
INSERT INTO gene_member VALUES (100), (200);
INSERT INTO seq_member VALUES (1, 100), (2, 200), (3, NULL), (4, NULL);
INSERT INTO homology_member VALUES (10, 1), (10, 2), (11, 3), (11, 4);
";
