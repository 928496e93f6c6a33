//! Error types for schema editing and SQL generation

/// Errors surfaced by the editor and the SQL tooling.
///
/// Validation findings are not errors; see [`crate::core::ValidationResult`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid schema file: {0}")]
    InvalidSchemaFile(#[source] serde_json::Error),

    #[error("Failed to serialize schema: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Column index {index} out of bounds (table has {len} columns)")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    #[error("Column '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Unknown SQL mode: {0}")]
    UnknownSqlMode(String),

    #[error("SQL syntax error: {0}")]
    SqlSyntax(String),
}

impl SchemaError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::InvalidSchemaFile(_) => "invalid_schema_file",
            SchemaError::Serialization(_) => "serialization_failed",
            SchemaError::TableNotFound(_) => "table_not_found",
            SchemaError::ColumnNotFound { .. } => "column_not_found",
            SchemaError::ColumnIndexOutOfBounds { .. } => "column_index_out_of_bounds",
            SchemaError::DuplicateColumn { .. } => "duplicate_column",
            SchemaError::UnknownSqlMode(_) => "unknown_sql_mode",
            SchemaError::SqlSyntax(_) => "sql_syntax",
        }
    }

    /// Whether the error refers to a missing table or column
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SchemaError::TableNotFound(_) | SchemaError::ColumnNotFound { .. }
        )
    }
}
