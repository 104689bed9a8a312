//! Transaction handle.
//!
//! Wraps one exclusively-reserved connection. Lifecycle: `begin` reserves
//! a connection, issues BEGIN and optionally the isolation level, then
//! statements run on that connection until `commit` or `rollback`. The
//! terminal state is sticky: the engine's protocol may send its own
//! COMMIT/ROLLBACK text through the statement path and then call the
//! terminal method, so a second call must be a no-op rather than an error.
//! The reserved connection is released on every exit path.

use std::str::FromStr;

use crate::client::{ReservedConnection, SqlClient};
use crate::driver::{run_query, Query};
use crate::driver::result::{affected_rows, build_result_set, ResultSet};
use crate::error::{convert_error, DriverError, ErrorKind, Result};

/// The standard isolation levels, parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl FromStr for IsolationLevel {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "read uncommitted" => Ok(IsolationLevel::ReadUncommitted),
            "read committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable read" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            _ => Err(DriverError::invalid_isolation_level(s)),
        }
    }
}

/// An open transaction owning one reserved connection.
pub struct Transaction {
    conn: Option<Box<dyn ReservedConnection>>,
}

impl Transaction {
    /// Reserve a connection and open the transaction on it.
    ///
    /// A reservation must never leak: if BEGIN or the isolation statement
    /// fails after the connection was reserved, the connection is rolled
    /// back best-effort and released before the error propagates.
    pub(crate) async fn begin(
        client: &dyn SqlClient,
        isolation: Option<IsolationLevel>,
    ) -> Result<Self> {
        let mut conn = client.reserve().await.map_err(convert_error)?;
        if let Err(err) = Self::open(conn.as_ref(), isolation).await {
            let _ = conn.execute("ROLLBACK", Vec::new()).await;
            conn.release().await;
            return Err(err);
        }
        tracing::debug!("transaction started");
        Ok(Self { conn: Some(conn) })
    }

    async fn open(
        conn: &dyn ReservedConnection,
        isolation: Option<IsolationLevel>,
    ) -> Result<()> {
        conn.execute("BEGIN", Vec::new())
            .await
            .map_err(convert_error)?;
        if let Some(level) = isolation {
            let sql = format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql());
            conn.execute(&sql, Vec::new()).await.map_err(convert_error)?;
        }
        Ok(())
    }

    /// Execute a query on the dedicated connection.
    pub async fn query_raw(&self, query: &Query) -> Result<ResultSet> {
        let result = run_query(self.executor()?, query).await?;
        build_result_set(result)
    }

    /// Execute a mutating statement on the dedicated connection.
    pub async fn execute_raw(&self, query: &Query) -> Result<u64> {
        let result = run_query(self.executor()?, query).await?;
        Ok(affected_rows(&result))
    }

    /// Commit and release the connection. Idempotent.
    pub async fn commit(&mut self) -> Result<()> {
        self.finish("COMMIT").await
    }

    /// Roll back and release the connection. Idempotent.
    pub async fn rollback(&mut self) -> Result<()> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, sql: &str) -> Result<()> {
        // Terminal state is sticky: a second call finds no connection.
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        let outcome = conn.execute(sql, Vec::new()).await;
        // Released even when the terminal statement failed.
        conn.release().await;
        tracing::debug!(statement = sql, "transaction terminated");
        outcome.map(|_| ()).map_err(convert_error)
    }

    fn executor(&self) -> Result<&dyn ReservedConnection> {
        match &self.conn {
            Some(conn) => Ok(conn.as_ref()),
            None => Err(DriverError::new(
                ErrorKind::ConnectionClosed,
                None,
                "transaction already terminated",
            )),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        // Abandoned without commit/rollback: hand the connection back from
        // a task, since release is async.
        if let Some(mut conn) = self.conn.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = conn.execute("ROLLBACK", Vec::new()).await;
                    conn.release().await;
                });
            }
        }
    }
}
