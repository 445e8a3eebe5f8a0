//! Database sessions for integrity checks
//!
//! Checks see databases only through [`DatabaseSession`]: run SQL, get rows
//! back. A [`SessionConnector`] opens a fresh session per check.
//!
//! ## Backends
//!
//! - SQLite (always available) - `sqlite://<path>`
//! - PostgreSQL (`postgres` feature) - `postgres://...`
//! - [`MockSession`] - canned results for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use genocheck_session::connector_for_url;
//!
//! let connector = connector_for_url("sqlite://dbs/hs110.sqlite", project_root)?;
//! let session = connector.connect().await?;
//! let genes = session.execute_count("SELECT COUNT(*) FROM gene").await?;
//! ```

pub mod session;
pub mod mock;
pub mod sqlite;
pub mod postgres;

pub use session::{DatabaseSession, Row, SessionConnector, SessionError, Value};
pub use mock::MockSession;
pub use sqlite::{SqliteConnector, SqliteSession};
pub use postgres::PostgresConnector;

#[cfg(feature = "postgres")]
pub use postgres::PostgresSession;

use std::path::Path;
use std::sync::Arc;

/// Build a connector from a configured URL
///
/// Relative SQLite paths resolve against `base_dir` (normally the directory
/// holding the config file).
pub fn connector_for_url(
    url: &str,
    base_dir: &Path,
) -> Result<Arc<dyn SessionConnector>, SessionError> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        if path.is_empty() {
            return Err(SessionError::Config(format!("No path in SQLite URL: {}", url)));
        }
        let path = Path::new(path);
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        };
        return Ok(Arc::new(SqliteConnector::new(resolved)));
    }

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok(Arc::new(PostgresConnector::new(url)));
    }

    Err(SessionError::Config(format!(
        "Unsupported database URL (expected sqlite:// or postgres://): {}",
        url
    )))
}
