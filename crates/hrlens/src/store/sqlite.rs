use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};

use super::guardrail::read_only_statement;
use super::{GatewayError, Record, Scalar, TabularGateway};

/// Read-only connections kept open between calls.
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 4;

/// Gateway over a single SQLite file. Connections are opened read-only on
/// demand, one per concurrent call, and up to `max_idle` are kept for reuse.
#[derive(Debug)]
pub struct SqliteGateway {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SchemaColumnDescriptor {
    name: String,
    declared_type: Option<String>,
}

impl SqliteGateway {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            idle: Mutex::new(Vec::new()),
            max_idle: DEFAULT_MAX_IDLE_CONNECTIONS,
        }
    }

    #[must_use]
    pub fn with_max_idle_connections(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn idle_connections(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or_default()
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let connection = match self.checkout()? {
            Some(connection) => connection,
            None => {
                let connection = open_read_only_connection(&self.path)?;
                tracing::debug!(path = %self.path.display(), "opened HR store connection");
                connection
            }
        };

        // The lock is not held while the query runs.
        let outcome = operation(&connection);
        self.release(connection);
        outcome
    }

    fn checkout(&self) -> Result<Option<Connection>, GatewayError> {
        let mut idle = self.idle.lock().map_err(|_| {
            GatewayError::StoreUnavailable("sqlite connection pool lock is poisoned".to_string())
        })?;
        Ok(idle.pop())
    }

    fn release(&self, connection: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(connection);
            }
        }
    }
}

impl TabularGateway for SqliteGateway {
    fn describe_schema(&self) -> Result<String, GatewayError> {
        self.with_connection(|connection| {
            let tables = load_table_names(connection)?;
            let mut lines = Vec::new();
            for table in tables {
                let columns = load_schema_columns(connection, &table)?
                    .into_iter()
                    .map(|column| {
                        format!(
                            "{} ({})",
                            column.name,
                            column.declared_type.unwrap_or_default()
                        )
                    })
                    .collect::<Vec<_>>();
                lines.push(format!("Table: {table}"));
                lines.push(format!("Columns: {}", columns.join(", ")));
                lines.push(String::new());
            }
            Ok(lines.join("\n"))
        })
    }

    fn execute(&self, query: &str) -> Result<Vec<Record>, GatewayError> {
        let statement_sql = read_only_statement(query).map_err(|violation| {
            tracing::debug!(
                reason = violation.reason.as_str(),
                "statement rejected before prepare"
            );
            GatewayError::QueryExecution(violation.message)
        })?;
        self.with_connection(|connection| execute_read_only_query(connection, statement_sql))
    }
}

fn open_read_only_connection(path: &Path) -> Result<Connection, GatewayError> {
    if !path.is_file() {
        return Err(GatewayError::StoreUnavailable(format!(
            "database file not found: {}",
            path.display()
        )));
    }

    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|error| {
        GatewayError::StoreUnavailable(format!(
            "failed to open sqlite database {}: {error}",
            path.display()
        ))
    })
}

fn load_table_names(connection: &Connection) -> Result<Vec<String>, GatewayError> {
    let mut statement = connection
        .prepare(
            "SELECT name
             FROM sqlite_schema
             WHERE type = 'table'
             ORDER BY name ASC",
        )
        .map_err(store_error)?;
    let names = statement
        .query_map([], |row| row.get::<usize, String>(0))
        .map_err(store_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(store_error)?;

    Ok(names
        .into_iter()
        .filter(|name| !is_internal_schema_object(name))
        .collect())
}

fn load_schema_columns(
    connection: &Connection,
    table_name: &str,
) -> Result<Vec<SchemaColumnDescriptor>, GatewayError> {
    let pragma_sql = format!("PRAGMA table_info({})", sqlite_single_quoted(table_name));
    let mut statement = connection.prepare(&pragma_sql).map_err(store_error)?;
    let columns = statement
        .query_map([], |row| {
            Ok(SchemaColumnDescriptor {
                name: row.get::<usize, String>(1)?,
                declared_type: row.get::<usize, Option<String>>(2)?,
            })
        })
        .map_err(store_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(store_error)?;
    Ok(columns)
}

fn execute_read_only_query(
    connection: &Connection,
    sql: &str,
) -> Result<Vec<Record>, GatewayError> {
    let mut statement = connection.prepare(sql).map_err(execution_error)?;
    if !statement.readonly() {
        return Err(GatewayError::QueryExecution(
            "statement would modify the HR store; only read-only queries are allowed".to_string(),
        ));
    }
    let column_names = statement
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = statement.query([]).map_err(execution_error)?;
    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(execution_error)? {
        let mut record = Record::new();
        for (index, column_name) in column_names.iter().enumerate() {
            let value = row.get::<usize, SqlValue>(index).map_err(execution_error)?;
            record.push(column_name.clone(), scalar_from_sql(value));
        }
        records.push(record);
    }

    Ok(records)
}

fn scalar_from_sql(value: SqlValue) -> Scalar {
    match value {
        SqlValue::Null => Scalar::Null,
        SqlValue::Integer(value) => Scalar::Integer(value),
        SqlValue::Real(value) => Scalar::Real(value),
        SqlValue::Text(value) => Scalar::Text(value),
        SqlValue::Blob(value) => Scalar::Text(encode_blob_hex(&value)),
    }
}

fn encode_blob_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push(HEX[(byte >> 4) as usize] as char);
        output.push(HEX[(byte & 0x0f) as usize] as char);
    }
    output
}

fn is_internal_schema_object(object_name: &str) -> bool {
    object_name.starts_with("sqlite_")
}

fn sqlite_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn store_error(error: rusqlite::Error) -> GatewayError {
    GatewayError::StoreUnavailable(error.to_string())
}

fn execution_error(error: rusqlite::Error) -> GatewayError {
    GatewayError::QueryExecution(error.to_string())
}
