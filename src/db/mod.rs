//! Database abstraction layer for askdb.
//!
//! Provides a trait-based interface for statement execution, allowing
//! different database backends to be used interchangeably. The generation
//! loop uses the executor as a live oracle: "does this statement run".

mod mock;
mod mysql;
mod postgres;
mod types;

pub use mock::MockDatabaseClient;
pub use mysql::MySqlClient;
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::{AskError, Result};
use async_trait::async_trait;
use sqlx::pool::{Pool, PoolOptions};
use sqlx::{Column as _, Row as _, TypeInfo as _};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows to return from a query.
const MAX_ROWS: usize = 1000;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

const POOL_SIZE: u32 = 5;
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }

    /// Parses a backend from a string or URL scheme.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::MySql => 3306,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }

    /// Returns the prefix of the backend's conventional environment variables.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Postgres => "PG",
            Self::MySql => "MYSQL_",
        }
    }
}

/// Creates a database client for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => Ok(Arc::new(PostgresClient::connect(config).await?)),
        DatabaseBackend::MySql => Ok(Arc::new(MySqlClient::connect(config).await?)),
    }
}

/// Trait defining the interface for statement executors.
///
/// `execute_query` fails with [`AskError::Query`] carrying the driver
/// diagnostic when the database rejects the statement, and with
/// [`AskError::Connection`] when the database can't be reached.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL statement and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Opens a pool for `config`, retrying transient failures with exponential backoff.
pub(crate) async fn open_pool<DB: sqlx::Database>(config: &ConnectionConfig) -> Result<Pool<DB>> {
    let url = config.to_connection_string()?;
    let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
    let mut attempt = 1;

    loop {
        let outcome = PoolOptions::<DB>::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect(&url)
            .await;

        match outcome {
            Ok(pool) => {
                debug!(attempt, "Connected to {}", config.display_string());
                return Ok(pool);
            }
            Err(e) if attempt < MAX_RETRY_ATTEMPTS && is_transient_error(&e) => {
                warn!(attempt, "Transient connection failure, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(map_connection_error(e, config)),
        }
    }
}

/// Awaits `fetch` under the query timeout and shapes its rows into a [`QueryResult`].
///
/// A statement that outlives the timeout is reported as a `Query` error: the
/// connection was healthy, so a rewritten statement may still succeed.
pub(crate) async fn collect_rows<R, F>(fetch: F, convert: fn(&R) -> Row) -> Result<QueryResult>
where
    R: sqlx::Row,
    F: Future<Output = std::result::Result<Vec<R>, sqlx::Error>>,
{
    let start = Instant::now();
    let fetched = tokio::time::timeout(Duration::from_secs(QUERY_TIMEOUT_SECS), fetch)
        .await
        .map_err(|_| {
            AskError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(execution_error)?;
    let elapsed = start.elapsed();

    let columns = fetched
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect()
        })
        .unwrap_or_default();

    let total_rows = fetched.len();
    if total_rows > MAX_ROWS {
        warn!(total_rows, "Result exceeds {} rows, truncating", MAX_ROWS);
    }
    let rows = fetched.iter().take(MAX_ROWS).map(convert).collect();

    Ok(QueryResult::capped(columns, rows, total_rows).with_execution_time(elapsed))
}

/// Classifies a failed statement.
///
/// Only a server diagnostic becomes a recoverable `Query` error. Losing the
/// pool or the socket is a `Connection` error that ends the request.
pub(crate) fn execution_error(error: sqlx::Error) -> AskError {
    if error.as_database_error().is_some() {
        return AskError::query(format_query_error(error));
    }

    match error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => {
            AskError::connection(format!("Lost connection to the database: {error}"))
        }
        _ => AskError::internal(format!("Unexpected driver error: {error}")),
    }
}

/// Formats a driver error into a diagnostic string.
///
/// Keeps the server's message verbatim so the error classifier can match
/// known shapes, then appends Postgres detail fields when present.
pub(crate) fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}

/// Determines if a connection error is transient and worth retrying.
pub(crate) fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("password authentication failed")
        || error_str.contains("access denied")
        || error_str.contains("does not exist")
        || error_str.contains("unknown database")
        || error_str.contains("ssl")
        || error_str.contains("tls")
    {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Maps sqlx connection errors to user-friendly messages without credentials.
pub(crate) fn map_connection_error(
    error: sqlx::Error,
    config: &ConnectionConfig,
) -> AskError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.effective_port();
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        AskError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("authentication failed") || error_str.contains("access denied") {
        AskError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if (error_str.contains("does not exist") && error_str.contains("database"))
        || error_str.contains("unknown database")
    {
        AskError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        AskError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        AskError::connection(format!(
            "Could not connect to {}",
            config.display_string()
        ))
    }
}
