//! Engine-facing adapter.
//!
//! Thin coordination layer composing the type catalog, normalizer,
//! argument mapper, and error translator around the underlying client's
//! execute/reserve/close primitives.
//!
//! Split across modules for easier maintenance:
//! - `result.rs` - result-set assembly and column acquisition
//! - `transaction.rs` - transaction handle state machine
//! - `factory.rs` - connection sources, shadow databases

pub mod factory;
pub mod result;
pub mod transaction;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::{QueryResult, SqlClient, SqlExecutor};
use crate::convert::{map_arg, ArgType};
use crate::error::{convert_error, Result};
use crate::value::PgValue;

use result::{affected_rows, build_result_set, ResultSet};
use transaction::{IsolationLevel, Transaction};

/// Maximum number of bind values a single PostgreSQL statement accepts.
pub const MAX_BIND_VALUES: u32 = 65_535;

/// A statement with typed positional arguments.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub sql: String,
    pub args: Vec<PgValue>,
    /// Parallel to `args`; missing entries default to an untyped scalar.
    pub arg_types: Vec<ArgType>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
            arg_types: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<PgValue>, ty: ArgType) -> Self {
        self.args.push(value.into());
        self.arg_types.push(ty);
        self
    }
}

/// Static facts about the connection, consumed once by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub schema_name: Option<String>,
    pub max_bind_values: u32,
    pub supports_relation_joins: bool,
}

/// A scratch database owned by a shadow adapter, dropped on dispose.
pub(crate) struct ShadowDatabase {
    pub(crate) admin: Arc<dyn SqlClient>,
    pub(crate) name: String,
}

/// Adapts the underlying client to the query engine's driver contract.
pub struct PgAdapter {
    client: Arc<dyn SqlClient>,
    schema_name: Option<String>,
    shadow: Option<ShadowDatabase>,
    disposed: AtomicBool,
}

impl PgAdapter {
    pub fn new(client: Arc<dyn SqlClient>, schema_name: Option<String>) -> Self {
        Self {
            client,
            schema_name,
            shadow: None,
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_shadow(mut self, shadow: ShadowDatabase) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Execute a query and return the typed result set.
    pub async fn query_raw(&self, query: &Query) -> Result<ResultSet> {
        let result = run_query(self.client.as_ref(), query).await?;
        build_result_set(result)
    }

    /// Execute a mutating statement and return the affected-row count.
    pub async fn execute_raw(&self, query: &Query) -> Result<u64> {
        let result = run_query(self.client.as_ref(), query).await?;
        Ok(affected_rows(&result))
    }

    /// Execute a multi-statement script. No parameter binding, no result.
    pub async fn execute_script(&self, sql: &str) -> Result<()> {
        self.client
            .execute(sql, Vec::new())
            .await
            .map_err(convert_error)?;
        Ok(())
    }

    /// Open a transaction on a dedicated connection.
    ///
    /// Rejects isolation levels outside the four standard ones before any
    /// connection is reserved.
    pub async fn start_transaction(&self, isolation: Option<&str>) -> Result<Transaction> {
        let level = match isolation {
            Some(s) => Some(s.parse::<IsolationLevel>()?),
            None => None,
        };
        Transaction::begin(self.client.as_ref(), level).await
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            schema_name: self.schema_name.clone(),
            max_bind_values: MAX_BIND_VALUES,
            supports_relation_joins: true,
        }
    }

    /// Close the client. Idempotent; also drops the shadow database when
    /// this adapter owns one.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.client.close().await;
        if let Some(shadow) = &self.shadow {
            let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\"", shadow.name);
            if let Err(err) = shadow.admin.execute(&drop_sql, Vec::new()).await {
                tracing::warn!(
                    database = %shadow.name,
                    error = %convert_error(err),
                    "failed to drop shadow database"
                );
            }
            shadow.admin.close().await;
        }
    }
}

/// Map every argument and hand the statement to an executor, translating
/// any client error before it can escape.
pub(crate) async fn run_query(
    executor: &dyn SqlExecutor,
    query: &Query,
) -> Result<QueryResult> {
    let default_ty = ArgType::default();
    let params = query
        .args
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let ty = query.arg_types.get(i).unwrap_or(&default_ty);
            map_arg(value.clone(), ty)
        })
        .collect();
    executor
        .execute(&query.sql, params)
        .await
        .map_err(convert_error)
}
