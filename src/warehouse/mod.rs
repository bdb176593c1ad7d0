//! Warehouse sessions
//!
//! An account is a directory, a database is a SQLite file inside it and a
//! schema is a second file attached under the schema's name. Tables always
//! live in the schema, so unqualified names in queries resolve there.

pub mod dialect;
pub mod result;
pub mod value;

use rusqlite::types::FromSql;
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::PathBuf;

use crate::config::ConnectionConfig;
use crate::error::{Result, WarehouseError};

pub use dialect::SessionInfo;
pub use result::{ResultTable, RowRef};
pub use value::SqlValue;

/// An open connection scoped to one database and schema
pub struct Warehouse {
    conn: Connection,
    info: SessionInfo,
    account_dir: PathBuf,
}

/// SQLite's own database names, unusable as schema aliases
const RESERVED_SCHEMAS: &[&str] = &["main", "temp"];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Identifiers are used as file names and schema aliases
fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    if !is_identifier(name) {
        return Err(WarehouseError::Database(format!(
            "Invalid {} identifier '{}'",
            kind, name
        )));
    }
    if kind == "schema" && RESERVED_SCHEMAS.contains(&name.to_lowercase().as_str()) {
        return Err(WarehouseError::Database(format!(
            "Schema name '{}' is reserved by the engine; use another schema",
            name
        )));
    }
    Ok(())
}

/// The account names a directory under the root and must stay inside it
fn validate_account(account: &str) -> Result<()> {
    if is_identifier(account) {
        Ok(())
    } else {
        Err(WarehouseError::Interface(format!(
            "Invalid account identifier '{}'",
            account
        )))
    }
}

fn database_file(config: &ConnectionConfig) -> PathBuf {
    config
        .account_dir()
        .join(format!("{}.db", config.database.to_lowercase()))
}

fn schema_file(config: &ConnectionConfig) -> PathBuf {
    config.account_dir().join(format!(
        "{}.{}.db",
        config.database.to_lowercase(),
        config.schema.to_lowercase()
    ))
}

impl Warehouse {
    /// Open a session. Fails if the account, database or schema does not exist.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        if config.user.trim().is_empty() {
            return Err(WarehouseError::Interface(
                "No user configured; set it in the secrets file or SALES_INSIGHTS_USER".into(),
            ));
        }

        validate_account(&config.account)?;
        let account_dir = config.account_dir();
        if !account_dir.is_dir() {
            return Err(WarehouseError::Interface(format!(
                "Account '{}' is unreachable ({:?} does not exist)",
                config.account, account_dir
            )));
        }

        validate_identifier("database", &config.database)?;
        validate_identifier("schema", &config.schema)?;

        let db_path = database_file(config);
        if !db_path.exists() {
            return Err(WarehouseError::Database(format!(
                "Database '{}' does not exist or not authorized",
                config.database
            )));
        }

        let schema_path = schema_file(config);
        if !schema_path.exists() {
            return Err(WarehouseError::Database(format!(
                "Schema '{}.{}' does not exist or not authorized",
                config.database, config.schema
            )));
        }

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| WarehouseError::Database(format!("Failed to open {:?}: {}", db_path, e)))?;

        let alias = config.schema.to_lowercase();
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", alias),
            [schema_path.to_string_lossy().as_ref()],
        )
        .map_err(|e| WarehouseError::Database(format!("Failed to attach schema: {}", e)))?;

        conn.execute_batch(&format!(
            "PRAGMA {0}.journal_mode = WAL;
             PRAGMA {0}.synchronous = NORMAL;",
            alias
        ))
        .map_err(|e| WarehouseError::Database(e.to_string()))?;

        let info = SessionInfo {
            database: config.database.to_uppercase(),
            schema: config.schema.to_uppercase(),
            warehouse: config.warehouse.to_uppercase(),
            user: config.user.clone(),
        };
        dialect::register(&conn, &info)
            .map_err(|e| WarehouseError::Database(format!("Failed to register functions: {}", e)))?;

        Ok(Self {
            conn,
            info,
            account_dir,
        })
    }

    /// Create the account directory, database and schema if missing, then connect
    pub fn create(config: &ConnectionConfig) -> Result<Self> {
        validate_account(&config.account)?;
        validate_identifier("database", &config.database)?;
        validate_identifier("schema", &config.schema)?;

        let account_dir = config.account_dir();
        fs::create_dir_all(&account_dir).map_err(|e| {
            WarehouseError::Database(format!("Failed to create {:?}: {}", account_dir, e))
        })?;

        for path in [database_file(config), schema_file(config)] {
            if !path.exists() {
                Connection::open(&path)
                    .and_then(|conn| conn.execute_batch("PRAGMA user_version = 1;"))
                    .map_err(|e| {
                        WarehouseError::Database(format!("Failed to create {:?}: {}", path, e))
                    })?;
            }
        }

        Self::connect(config)
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn account_dir(&self) -> &std::path::Path {
        &self.account_dir
    }

    /// Schema-qualified table name
    pub fn qualify(&self, table: &str) -> String {
        format!("{}.{}", self.info.schema.to_lowercase(), table)
    }

    /// Run one or more statements that return no rows
    pub fn execute(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| WarehouseError::programming(e, sql))
    }

    /// Run a query and collect every row
    pub fn query(&self, sql: &str) -> Result<ResultTable> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| WarehouseError::programming(e, sql))?;

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut rows = stmt
            .query([])
            .map_err(|e| WarehouseError::programming(e, sql))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| WarehouseError::programming(e, sql))? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| WarehouseError::programming(e, sql))?;
                cells.push(SqlValue::from(value));
            }
            out.push(cells);
        }

        Ok(ResultTable::new(columns, out))
    }

    /// Run a query returning a single value
    pub fn query_scalar<T: FromSql>(&self, sql: &str) -> Result<T> {
        self.conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| WarehouseError::programming(e, sql))
    }

    /// Start a transaction for bulk loads
    pub fn transaction(&mut self) -> Result<rusqlite::Transaction<'_>> {
        self.conn
            .transaction()
            .map_err(|e| WarehouseError::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Close the session, reporting any error from the engine
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| WarehouseError::Database(format!("Failed to close session: {}", e)))
    }
}
