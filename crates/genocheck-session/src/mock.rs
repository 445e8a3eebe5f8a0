//! Mock session for testing
//!
//! Returns canned rows for known SQL without touching a database. Useful for:
//! - Unit testing check logic against exact query results
//! - Exercising the runner's timeout and failure handling
//! - Simulating connection and query errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use genocheck_session::{MockSession, SessionConnector, Value};
//!
//! let mock = MockSession::new();
//! mock.add_scalar("SELECT COUNT(*) FROM gene", Value::Int(20_000)).await;
//!
//! let session = mock.connect().await?;
//! let count = session.execute_count("SELECT COUNT(*) FROM gene").await?;
//! ```
//!
//! Clones share canned results and the query log, so a test can hand one
//! clone to the runner as a connector and inspect another afterwards.

use crate::session::{DatabaseSession, Row, SessionConnector, SessionError, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collapse whitespace so formatting differences don't matter
fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// In-memory session with canned results
pub struct MockSession {
    /// Canned rows by normalized SQL
    results: Arc<RwLock<HashMap<String, Vec<Row>>>>,

    /// Errors to return for specific SQL
    errors: Arc<RwLock<HashMap<String, SessionError>>>,

    /// Every query executed, in order
    executed: Arc<RwLock<Vec<String>>>,

    /// Fail every `connect`
    fail_connection: bool,

    /// Simulated query latency (milliseconds)
    latency_ms: u64,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            executed: Arc::new(RwLock::new(Vec::new())),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Return `rows` whenever `sql` is executed
    pub async fn add_rows(&self, sql: &str, rows: Vec<Row>) {
        self.results.write().await.insert(normalize(sql), rows);
    }

    /// Return a single-value result for `sql`
    pub async fn add_scalar(&self, sql: &str, value: Value) {
        self.add_rows(sql, vec![vec![value]]).await;
    }

    /// Fail `sql` with the given error
    pub async fn add_error(&self, sql: &str, error: SessionError) {
        self.errors.write().await.insert(normalize(sql), error);
    }

    /// Make every `connect` fail
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Delay every query, for exercising timeouts
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Queries executed so far (normalized)
    pub async fn executed(&self) -> Vec<String> {
        self.executed.read().await.clone()
    }

    pub async fn clear(&self) {
        self.results.write().await.clear();
        self.errors.write().await.clear();
        self.executed.write().await.clear();
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockSession {
    fn clone(&self) -> Self {
        Self {
            results: Arc::clone(&self.results),
            errors: Arc::clone(&self.errors),
            executed: Arc::clone(&self.executed),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl DatabaseSession for MockSession {
    fn backend(&self) -> &'static str {
        "Mock"
    }

    async fn execute_rows(&self, sql: &str) -> Result<Vec<Row>, SessionError> {
        let key = normalize(sql);
        self.executed.write().await.push(key.clone());
        self.simulate_latency().await;

        if let Some(error) = self.errors.read().await.get(&key) {
            return Err(error.clone());
        }

        self.results
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| SessionError::query(sql, "no canned result for query"))
    }
}

#[async_trait::async_trait]
impl SessionConnector for MockSession {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    async fn connect(&self) -> Result<Box<dyn DatabaseSession>, SessionError> {
        if self.fail_connection {
            return Err(SessionError::Connectivity(
                "Mock connection failure (simulated)".to_string(),
            ));
        }
        Ok(Box::new(self.clone()))
    }
}
