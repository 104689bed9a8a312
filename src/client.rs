//! Collaborator traits for the underlying PostgreSQL client.
//!
//! The outer pooling client is a black box: it executes parameterized
//! statements, reserves dedicated connections, and closes. Everything else
//! (pooling strategy, wire framing, cancellation) stays on its side of the
//! boundary. Implementations suspend only at these I/O points.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::value::PgValue;

/// Per-column metadata, when the client exposes it.
#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
    pub type_oid: u32,
}

/// One result row: ordered (column name, value) pairs.
///
/// Names travel with the values because the common case for this client is
/// no column metadata at all; the bridge then derives the column list from
/// the shape of the first row.
pub type Row = Vec<(String, PgValue)>;

/// Raw result of one statement execution.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    /// Authoritative column metadata, when available.
    pub columns: Option<Vec<ColumnMeta>>,
    /// Affected-row counter for INSERT/UPDATE/DELETE. The row-array length
    /// is unreliable for those: it is 0 for non-RETURNING statements.
    pub affected_rows: Option<u64>,
}

/// Anything that can execute a parameterized statement.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(
        &self,
        sql: &str,
        params: Vec<PgValue>,
    ) -> std::result::Result<QueryResult, ClientError>;
}

/// A connection checked out exclusively for one transaction.
#[async_trait]
pub trait ReservedConnection: SqlExecutor {
    /// Return the connection to the pool. Called exactly once per
    /// reservation; the transaction handle guarantees that.
    async fn release(&mut self);
}

/// The pooled client itself.
#[async_trait]
pub trait SqlClient: SqlExecutor {
    /// Check out a dedicated connection.
    async fn reserve(&self) -> std::result::Result<Box<dyn ReservedConnection>, ClientError>;

    /// Close the client and all pooled connections.
    async fn close(&self);
}
