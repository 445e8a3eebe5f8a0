//! SQLite session
//!
//! Opens database files read-only. Queries run on the blocking pool so a
//! long scan never stalls the runtime's worker threads.

use crate::session::{DatabaseSession, Row, SessionConnector, SessionError, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Session over one SQLite database file
pub struct SqliteSession {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteSession {
    /// Open an existing database file read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&path, flags).map_err(|e| {
            SessionError::Connectivity(format!("cannot open {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "opened SQLite session");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(":memory:"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn convert(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn query_rows(conn: &Connection, sql: &str) -> Result<Vec<Row>, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query([])?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(convert(row.get_ref(idx)?));
        }
        result.push(values);
    }
    Ok(result)
}

#[async_trait::async_trait]
impl DatabaseSession for SqliteSession {
    fn backend(&self) -> &'static str {
        "SQLite"
    }

    async fn execute_rows(&self, sql: &str) -> Result<Vec<Row>, SessionError> {
        let conn = Arc::clone(&self.conn);
        let owned_sql = sql.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| SessionError::Connectivity("SQLite connection poisoned".to_string()))?;
            query_rows(&conn, &owned_sql).map_err(|e| SessionError::query(owned_sql.as_str(), e))
        })
        .await
        .map_err(|e| SessionError::query(sql, format!("query task failed: {}", e)))?;

        result
    }
}

/// Connector for a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SessionConnector for SqliteConnector {
    fn describe(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    async fn connect(&self) -> Result<Box<dyn DatabaseSession>, SessionError> {
        Ok(Box::new(SqliteSession::open(&self.path)?))
    }
}
