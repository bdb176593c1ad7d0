//! Error types for warehouse sessions

use thiserror::Error;

/// Failures raised while talking to the warehouse.
///
/// Every kind is handled the same way by the commands: report and stop.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Bad or missing credentials, unreachable account
    #[error("Failed to connect to warehouse: {0}")]
    Interface(String),

    /// Missing database, schema or object, or insufficient permissions
    #[error("Database error: {0}")]
    Database(String),

    /// Malformed SQL, type mismatches and other execution failures
    #[error("Query failed: {message}\nFailed query: {query}")]
    Programming { message: String, query: String },
}

impl WarehouseError {
    pub fn programming(err: impl std::fmt::Display, query: &str) -> Self {
        WarehouseError::Programming {
            message: err.to_string(),
            query: query.trim().to_string(),
        }
    }

    /// User-facing hint listing the usual causes of this kind of failure
    pub fn hint(&self) -> &'static str {
        match self {
            WarehouseError::Interface(_) => {
                "Possible causes: Invalid credentials, incorrect account name, or network issues."
            }
            WarehouseError::Database(_) => {
                "Possible causes: Database, schema, or warehouse does not exist, or user lacks permissions."
            }
            WarehouseError::Programming { .. } => {
                "Possible causes: Malformed SQL, a missing table or column, or a type mismatch."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
