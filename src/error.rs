//! Error taxonomy and translation.
//!
//! Every native error crossing into the engine-facing API is wrapped in
//! [`DriverError`] before it leaves this crate. The original native code
//! and message are always preserved as diagnostic fields, even when a
//! specific kind is matched, so tooling can fall back to the raw detail.

use std::fmt;

use thiserror::Error;

/// Code attached when the client threw something without one.
const UNKNOWN_CODE: &str = "unknown";

/// Structured error fields as the server reports them.
#[derive(Debug, Clone, Default)]
pub struct ServerError {
    /// SQLSTATE code, e.g. `23505`.
    pub code: String,
    pub message: String,
    pub severity: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    pub column: Option<String>,
    pub table: Option<String>,
    pub constraint: Option<String>,
}

/// The heterogeneous error shapes the underlying client can surface.
#[derive(Debug, Clone)]
pub enum ClientError {
    /// A structured server error carrying a SQLSTATE code.
    Server(ServerError),
    /// A client-internal failure (connection refused, timeout, TLS, ...).
    Connection { code: String, message: String },
    /// Anything else the client threw, stringified.
    Other(String),
}

/// The constraint affected by a constraint-violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Field list extracted from the `Key (...)=` detail message.
    Fields(Vec<String>),
    /// Bare constraint or index name, when no parseable detail exists.
    Index(String),
    Unknown,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Fields(fields) => write!(f, "fields: ({})", fields.join(", ")),
            Constraint::Index(name) => write!(f, "constraint: {}", name),
            Constraint::Unknown => write!(f, "(not available)"),
        }
    }
}

/// The closed set of error kinds the query engine understands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("value too long for column {column:?}")]
    LengthMismatch { column: Option<String> },

    #[error("value out of range: {cause}")]
    ValueOutOfRange { cause: String },

    #[error("invalid input value: {cause}")]
    InvalidInputValue { cause: String },

    #[error("unique constraint violated: {constraint}")]
    UniqueConstraintViolation { constraint: Constraint },

    #[error("null constraint violated: {constraint}")]
    NullConstraintViolation { constraint: Constraint },

    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyConstraintViolation { constraint: Constraint },

    #[error("database does not exist: {db:?}")]
    DatabaseDoesNotExist { db: Option<String> },

    #[error("database already exists: {db:?}")]
    DatabaseAlreadyExists { db: Option<String> },

    #[error("access denied to database {db:?}")]
    DatabaseAccessDenied { db: Option<String> },

    #[error("authentication failed for user {user:?}")]
    AuthenticationFailed { user: Option<String> },

    #[error("transaction write conflict")]
    TransactionWriteConflict,

    #[error("table does not exist: {table:?}")]
    TableDoesNotExist { table: Option<String> },

    #[error("column not found: {column:?}")]
    ColumnNotFound { column: Option<String> },

    #[error("too many connections: {cause}")]
    TooManyConnections { cause: String },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("socket timeout")]
    SocketTimeout,

    #[error("TLS connection error: {cause}")]
    TlsConnectionError { cause: String },

    #[error("database is not reachable: {cause}")]
    DatabaseNotReachable { cause: String },

    #[error("unsupported native data type (oid {oid})")]
    UnsupportedNativeDataType { oid: u32 },

    #[error("invalid isolation level: {level}")]
    InvalidIsolationLevel { level: String },

    /// Generic passthrough for unrecognized codes; keeps the raw fields.
    #[error("postgres error {code}: {message}")]
    Postgres {
        code: String,
        message: String,
        severity: String,
        detail: Option<String>,
        hint: Option<String>,
        column: Option<String>,
    },
}

/// A translated driver error.
///
/// `original_code` and `original_message` are always populated from the
/// native error when one existed, regardless of which kind was matched.
#[derive(Debug, Clone)]
pub struct DriverError {
    pub kind: ErrorKind,
    pub original_code: Option<String>,
    pub original_message: String,
}

impl DriverError {
    pub fn new(kind: ErrorKind, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            original_code: code,
            original_message: message.into(),
        }
    }

    pub fn unsupported_native_type(oid: u32) -> Self {
        Self::new(
            ErrorKind::UnsupportedNativeDataType { oid },
            None,
            format!("no column type mapping for oid {}", oid),
        )
    }

    pub fn invalid_isolation_level(level: &str) -> Self {
        Self::new(
            ErrorKind::InvalidIsolationLevel {
                level: level.to_string(),
            },
            None,
            format!("invalid isolation level: {}", level),
        )
    }

    /// Connection configuration problems detected before any statement ran.
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorKind::Postgres {
                code: UNKNOWN_CODE.to_string(),
                message: message.clone(),
                severity: "ERROR".to_string(),
                detail: None,
                hint: None,
                column: None,
            },
            Some(UNKNOWN_CODE.to_string()),
            message,
        )
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(code) = &self.original_code {
            write!(f, " [{}: {}]", code, self.original_message)?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Translate a client error into the closed taxonomy.
pub fn convert_error(err: ClientError) -> DriverError {
    match err {
        ClientError::Server(e) => convert_server_error(e),
        ClientError::Connection { code, message } => convert_connection_error(code, message),
        ClientError::Other(message) => DriverError::new(
            ErrorKind::Postgres {
                code: UNKNOWN_CODE.to_string(),
                message: message.clone(),
                severity: "ERROR".to_string(),
                detail: None,
                hint: None,
                column: None,
            },
            Some(UNKNOWN_CODE.to_string()),
            message,
        ),
    }
}

fn convert_server_error(e: ServerError) -> DriverError {
    let kind = match e.code.as_str() {
        "22001" => ErrorKind::LengthMismatch {
            column: e.column.clone(),
        },
        "22003" => ErrorKind::ValueOutOfRange {
            cause: e.message.clone(),
        },
        "22P02" => ErrorKind::InvalidInputValue {
            cause: e.message.clone(),
        },
        "23505" => ErrorKind::UniqueConstraintViolation {
            constraint: extract_constraint(&e),
        },
        "23502" => ErrorKind::NullConstraintViolation {
            constraint: extract_constraint(&e),
        },
        "23503" => ErrorKind::ForeignKeyConstraintViolation {
            constraint: extract_constraint(&e),
        },
        "3D000" => ErrorKind::DatabaseDoesNotExist {
            db: extract_quoted(&e.message),
        },
        "42P04" => ErrorKind::DatabaseAlreadyExists {
            db: extract_quoted(&e.message),
        },
        "28000" => ErrorKind::DatabaseAccessDenied {
            db: extract_quoted(&e.message),
        },
        "28P01" => ErrorKind::AuthenticationFailed {
            user: extract_quoted(&e.message),
        },
        "40001" => ErrorKind::TransactionWriteConflict,
        "42P01" => ErrorKind::TableDoesNotExist {
            table: extract_quoted(&e.message),
        },
        "42703" => ErrorKind::ColumnNotFound {
            column: extract_quoted(&e.message),
        },
        "53300" => ErrorKind::TooManyConnections {
            cause: e.message.clone(),
        },
        _ => ErrorKind::Postgres {
            code: e.code.clone(),
            message: e.message.clone(),
            severity: e.severity.clone(),
            detail: e.detail.clone(),
            hint: e.hint.clone(),
            column: e.column.clone(),
        },
    };
    DriverError::new(kind, Some(e.code), e.message)
}

fn convert_connection_error(code: String, message: String) -> DriverError {
    let kind = if code.contains("CONNECTION_CLOSED") {
        ErrorKind::ConnectionClosed
    } else if code.contains("TIMEOUT") {
        ErrorKind::SocketTimeout
    } else if code.contains("TLS") || code.contains("SSL") {
        ErrorKind::TlsConnectionError {
            cause: message.clone(),
        }
    } else if code.contains("AUTHENTICATION_FAILED") {
        ErrorKind::AuthenticationFailed { user: None }
    } else if code == "ECONNREFUSED"
        || code == "ENOTFOUND"
        || code == "EHOSTUNREACH"
        || code.contains("UNREACHABLE")
    {
        ErrorKind::DatabaseNotReachable {
            cause: message.clone(),
        }
    } else {
        ErrorKind::Postgres {
            code: code.clone(),
            message: message.clone(),
            severity: "ERROR".to_string(),
            detail: None,
            hint: None,
            column: None,
        }
    };
    DriverError::new(kind, Some(code), message)
}

/// Pull the affected field list out of a `Key (a, b)=(...)` detail line,
/// falling back to the bare constraint name when no detail parses.
fn extract_constraint(e: &ServerError) -> Constraint {
    if let Some(detail) = &e.detail {
        if let Some(start) = detail.find("Key (") {
            let rest = &detail[start + 5..];
            if let Some(end) = rest.find(')') {
                if rest[end..].starts_with(")=") {
                    let fields = rest[..end]
                        .split(',')
                        .map(|f| f.trim().to_string())
                        .collect();
                    return Constraint::Fields(fields);
                }
            }
        }
    }
    match &e.constraint {
        Some(name) => Constraint::Index(name.clone()),
        None => Constraint::Unknown,
    }
}

/// First double-quoted token in a server message, e.g. the database name
/// in `database "foo" does not exist`.
fn extract_quoted(message: &str) -> Option<String> {
    let start = message.find('"')?;
    let rest = &message[start + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(code: &str, message: &str) -> ServerError {
        ServerError {
            code: code.to_string(),
            message: message.to_string(),
            severity: "ERROR".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_violation_extracts_fields() {
        let mut e = server_error("23505", "duplicate key value violates unique constraint");
        e.detail = Some("Key (email)=(x) already exists.".to_string());
        e.constraint = Some("users_email_key".to_string());

        let err = convert_error(ClientError::Server(e));
        assert_eq!(
            err.kind,
            ErrorKind::UniqueConstraintViolation {
                constraint: Constraint::Fields(vec!["email".to_string()])
            }
        );
        assert_eq!(err.original_code.as_deref(), Some("23505"));
    }

    #[test]
    fn test_compound_key_fields_are_split_and_trimmed() {
        let mut e = server_error("23505", "duplicate key");
        e.detail = Some("Key (tenant_id, email)=(1, x) already exists.".to_string());
        let err = convert_error(ClientError::Server(e));
        assert_eq!(
            err.kind,
            ErrorKind::UniqueConstraintViolation {
                constraint: Constraint::Fields(vec![
                    "tenant_id".to_string(),
                    "email".to_string()
                ])
            }
        );
    }

    #[test]
    fn test_constraint_name_fallback() {
        let mut e = server_error("23503", "violates foreign key constraint");
        e.constraint = Some("orders_user_id_fkey".to_string());
        let err = convert_error(ClientError::Server(e));
        assert_eq!(
            err.kind,
            ErrorKind::ForeignKeyConstraintViolation {
                constraint: Constraint::Index("orders_user_id_fkey".to_string())
            }
        );
    }

    #[test]
    fn test_database_does_not_exist() {
        let e = server_error("3D000", r#"database "missing_db" does not exist"#);
        let err = convert_error(ClientError::Server(e));
        assert_eq!(
            err.kind,
            ErrorKind::DatabaseDoesNotExist {
                db: Some("missing_db".to_string())
            }
        );
    }

    #[test]
    fn test_unrecognized_code_passes_through() {
        let mut e = server_error("57014", "canceling statement due to user request");
        e.hint = Some("try again".to_string());
        let err = convert_error(ClientError::Server(e));
        match err.kind {
            ErrorKind::Postgres {
                code,
                severity,
                hint,
                ..
            } => {
                assert_eq!(code, "57014");
                assert_eq!(severity, "ERROR");
                assert_eq!(hint.as_deref(), Some("try again"));
            }
            other => panic!("expected passthrough, got {:?}", other),
        }
        assert_eq!(err.original_code.as_deref(), Some("57014"));
    }

    #[test]
    fn test_connection_code_classification() {
        let closed = convert_error(ClientError::Connection {
            code: "ERR_POSTGRES_CONNECTION_CLOSED".to_string(),
            message: "connection closed".to_string(),
        });
        assert_eq!(closed.kind, ErrorKind::ConnectionClosed);

        let timeout = convert_error(ClientError::Connection {
            code: "ERR_POSTGRES_IDLE_TIMEOUT".to_string(),
            message: "idle timeout".to_string(),
        });
        assert_eq!(timeout.kind, ErrorKind::SocketTimeout);

        let tls = convert_error(ClientError::Connection {
            code: "ERR_TLS_HANDSHAKE".to_string(),
            message: "handshake failed".to_string(),
        });
        assert!(matches!(tls.kind, ErrorKind::TlsConnectionError { .. }));

        let refused = convert_error(ClientError::Connection {
            code: "ECONNREFUSED".to_string(),
            message: "connection refused".to_string(),
        });
        assert!(matches!(
            refused.kind,
            ErrorKind::DatabaseNotReachable { .. }
        ));
    }

    #[test]
    fn test_thrown_non_error_becomes_unknown_passthrough() {
        let err = convert_error(ClientError::Other("something odd".to_string()));
        assert_eq!(err.original_code.as_deref(), Some("unknown"));
        assert_eq!(err.original_message, "something odd");
        assert!(matches!(err.kind, ErrorKind::Postgres { .. }));
    }
}
