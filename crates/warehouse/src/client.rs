//! Warehouse client wrapper.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::WarehouseConfig;
use crate::runner::StatementExecutor;
use etl_core::error::DbErrorCode;
use etl_core::{Error, Result};

/// Single warehouse session.
///
/// The pipeline is strictly sequential, so one connection serves every
/// statement of a run. Statements go through the simple query protocol,
/// which Redshift and Postgres both accept for DDL and COPY.
pub struct WarehouseClient {
    conn: Mutex<PgConnection>,
}

impl WarehouseClient {
    /// Opens the session.
    pub async fn connect(config: WarehouseConfig) -> Result<Self> {
        let options = config.connect_options();
        let timeout = Duration::from_secs(config.connect_timeout_secs.max(1));

        let conn = tokio::time::timeout(timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| {
                Error::database(
                    DbErrorCode::ConnectFailed,
                    format!(
                        "timed out after {}s connecting to {}:{}",
                        timeout.as_secs(),
                        config.host,
                        config.port
                    ),
                )
            })?
            .map_err(|e| {
                Error::database(
                    DbErrorCode::ConnectFailed,
                    format!("{}:{}: {}", config.host, config.port, describe(&e)),
                )
            })?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected to warehouse"
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs one statement and returns the affected row count.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        let mut conn = self.conn.lock().await;
        let conn: &mut PgConnection = &mut conn;
        let result = conn
            .execute(sqlx::raw_sql(sql))
            .await
            .map_err(|e| Error::database(DbErrorCode::StatementFailed, describe(&e)))?;
        debug!(rows = result.rows_affected(), "Statement complete");
        Ok(result.rows_affected())
    }

    /// Exclusive access to the session for typed queries.
    pub async fn connection(&self) -> MutexGuard<'_, PgConnection> {
        self.conn.lock().await
    }

    /// Closes the session gracefully.
    pub async fn close(self) -> Result<()> {
        self.conn
            .into_inner()
            .close()
            .await
            .map_err(|e| Error::database(DbErrorCode::ConnectFailed, describe(&e)))?;
        debug!("Warehouse connection closed");
        Ok(())
    }
}

#[async_trait]
impl StatementExecutor for WarehouseClient {
    async fn execute(&self, sql: &str) -> Result<u64> {
        WarehouseClient::execute(self, sql).await
    }
}

/// Driver error text, with the SQLSTATE when the server reported one.
pub(crate) fn describe(err: &sqlx::Error) -> String {
    match err.as_database_error() {
        Some(db) => match db.code() {
            Some(code) => format!("{} (SQLSTATE {})", db.message(), code),
            None => db.message().to_string(),
        },
        None => err.to_string(),
    }
}
