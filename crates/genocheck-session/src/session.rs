//! Database session trait and the values it returns

use std::fmt;

/// A single column value returned by a query
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value
    ///
    /// Whole floats and numeric text are accepted since drivers disagree on
    /// how `COUNT(*)` and `SUM(...)` come back.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a driver's text rendering of a value
    pub fn from_text(text: Option<&str>) -> Self {
        match text {
            None => Self::Null,
            Some(s) => {
                if let Ok(i) = s.parse::<i64>() {
                    Self::Int(i)
                } else if let Ok(f) = s.parse::<f64>() {
                    Self::Float(f)
                } else {
                    Self::Text(s.to_string())
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One result row, columns in select-list order
pub type Row = Vec<Value>;

/// Errors raised by a session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    Connectivity(String),

    #[error("Query failed: {message} (SQL: {sql})")]
    Query { sql: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionError {
    pub fn query(sql: impl Into<String>, message: impl ToString) -> Self {
        Self::Query {
            sql: sql.into(),
            message: message.to_string(),
        }
    }

    /// Whether the database could not be reached at all
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::Config(_))
    }
}

/// Read-only query access to one database
///
/// Sessions only execute what they are given; checks build the SQL.
#[async_trait::async_trait]
pub trait DatabaseSession: Send + Sync {
    /// Backend name (e.g. "SQLite", "PostgreSQL")
    fn backend(&self) -> &'static str;

    /// Run a query and collect every row
    async fn execute_rows(&self, sql: &str) -> Result<Vec<Row>, SessionError>;

    /// First column of the first row, or `None` for an empty result
    async fn execute_scalar(&self, sql: &str) -> Result<Option<Value>, SessionError> {
        let rows = self.execute_rows(sql).await?;
        Ok(rows.into_iter().next().and_then(|row| row.into_iter().next()))
    }

    /// Integer scalar; NULL and empty results count as zero
    async fn execute_count(&self, sql: &str) -> Result<i64, SessionError> {
        match self.execute_scalar(sql).await? {
            None | Some(Value::Null) => Ok(0),
            Some(value) => value
                .as_i64()
                .ok_or_else(|| SessionError::query(sql, format!("expected an integer, got {}", value))),
        }
    }

    /// Verify the session can answer a trivial query
    async fn test_connection(&self) -> Result<(), SessionError> {
        self.execute_scalar("SELECT 1").await.map(|_| ())
    }
}

/// Opens sessions to one configured database
///
/// Every check gets its own session so a slow or failing check cannot
/// poison another's connection.
#[async_trait::async_trait]
pub trait SessionConnector: Send + Sync {
    /// Human-readable target, never including credentials
    fn describe(&self) -> String;

    async fn connect(&self) -> Result<Box<dyn DatabaseSession>, SessionError>;
}
