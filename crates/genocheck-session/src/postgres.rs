//! PostgreSQL session
//!
//! Runs check SQL through the simple query protocol, so every value comes
//! back as text and is parsed into a [`Value`]. Works with PostgreSQL 9.4+
//! and compatible servers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let connector = PostgresConnector::new("postgres://ro@db.example.org/homo_sapiens_core_110_38");
//! let session = connector.connect().await?;
//!
//! // TLS is used when the URL asks for it
//! let connector = PostgresConnector::new("postgres://ro@db.example.org/db?sslmode=require");
//! ```
//!
//! Requires the `postgres` feature; without it `connect` returns a
//! configuration error.

use crate::session::{DatabaseSession, SessionConnector, SessionError};

#[cfg(feature = "postgres")]
use crate::session::{Row, Value};

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, Config as PgConfig, NoTls, SimpleQueryMessage};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

/// Session over one PostgreSQL connection
#[cfg(feature = "postgres")]
pub struct PostgresSession {
    client: Client,

    host: String,

    port: u16,

    database: String,
}

#[cfg(feature = "postgres")]
impl PostgresSession {
    /// Connect using a connection string or URL
    ///
    /// TLS is negotiated when `tls` is set; the server certificate is
    /// verified against the system trust store.
    pub async fn connect(conn_str: &str, tls: bool) -> Result<Self, SessionError> {
        let config: PgConfig = conn_str
            .parse()
            .map_err(|e| SessionError::Config(format!("Invalid connection string: {}", e)))?;

        let host = config
            .get_hosts()
            .first()
            .map(|h| format!("{:?}", h))
            .unwrap_or_else(|| "localhost".to_string());
        let port = config.get_ports().first().copied().unwrap_or(5432);
        let database = config.get_dbname().unwrap_or("postgres").to_string();

        let client = if tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| SessionError::Config(format!("Failed to create TLS connector: {}", e)))?;
            let (client, connection) = config
                .connect(MakeTlsConnector::new(connector))
                .await
                .map_err(|e| {
                    SessionError::Connectivity(format!(
                        "Failed to connect to PostgreSQL at {}:{} with TLS: {}",
                        host, port, e
                    ))
                })?;
            Self::drive(connection, host.clone(), port);
            client
        } else {
            let (client, connection) = config.connect(NoTls).await.map_err(|e| {
                SessionError::Connectivity(format!(
                    "Failed to connect to PostgreSQL at {}:{}: {}",
                    host, port, e
                ))
            })?;
            Self::drive(connection, host.clone(), port);
            client
        };

        tracing::debug!(%host, port, %database, tls, "opened PostgreSQL session");

        Ok(Self {
            client,
            host,
            port,
            database,
        })
    }

    /// Spawn the connection handler in the background
    fn drive<F>(connection: F, host: String, port: u16)
    where
        F: std::future::Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(%host, port, error = %e, "PostgreSQL connection error");
            }
        });
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[cfg(feature = "postgres")]
#[async_trait::async_trait]
impl DatabaseSession for PostgresSession {
    fn backend(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn execute_rows(&self, sql: &str) -> Result<Vec<Row>, SessionError> {
        let messages = self.client.simple_query(sql).await.map_err(|e| {
            if e.is_closed() {
                SessionError::Connectivity(format!("{}:{}: {}", self.host, self.port, e))
            } else {
                SessionError::query(sql, e)
            }
        })?;

        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                rows.push((0..row.len()).map(|idx| Value::from_text(row.get(idx))).collect());
            }
        }
        Ok(rows)
    }
}

/// Connector for a PostgreSQL database
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    conn_str: String,
    tls: bool,
}

impl PostgresConnector {
    /// TLS is enabled when the URL carries `sslmode=require`
    pub fn new(conn_str: impl Into<String>) -> Self {
        let conn_str = conn_str.into();
        let tls = conn_str.contains("sslmode=require");
        Self { conn_str, tls }
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn uses_tls(&self) -> bool {
        self.tls
    }

    /// Connection target without the password
    fn redacted(&self) -> String {
        match (self.conn_str.find("://"), self.conn_str.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                let userinfo = &self.conn_str[scheme_end + 3..at];
                let user = userinfo.split(':').next().unwrap_or_default();
                format!("{}{}@{}", &self.conn_str[..scheme_end + 3], user, &self.conn_str[at + 1..])
            }
            _ => self.conn_str.clone(),
        }
    }
}

#[async_trait::async_trait]
impl SessionConnector for PostgresConnector {
    fn describe(&self) -> String {
        self.redacted()
    }

    #[cfg(feature = "postgres")]
    async fn connect(&self) -> Result<Box<dyn DatabaseSession>, SessionError> {
        Ok(Box::new(PostgresSession::connect(&self.conn_str, self.tls).await?))
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect(&self) -> Result<Box<dyn DatabaseSession>, SessionError> {
        Err(SessionError::Config(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string(),
        ))
    }
}
