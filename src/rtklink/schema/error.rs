//! Schema registry and validation error types

use std::fmt;

/// Error type for schema registry and validation operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A name or definition argument was rejected
    InvalidParam(String),
    /// No schema registered under the requested name
    NotFound { name: String },
    /// The document under validation is not parseable JSON
    InvalidJson {
        message: String,
        line: usize,
        column: usize,
    },
    /// The bounded registry table is full
    Capacity { limit: usize },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::InvalidParam(msg) => write!(f, "Invalid parameter: {}", msg),
            SchemaError::NotFound { name } => write!(f, "Schema not found: {}", name),
            SchemaError::InvalidJson {
                message,
                line,
                column,
            } => write!(
                f,
                "Invalid JSON at line {} column {}: {}",
                line, column, message
            ),
            SchemaError::Capacity { limit } => {
                write!(f, "Schema registry full (capacity {})", limit)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

pub type SchemaResult<T> = Result<T, SchemaError>;
