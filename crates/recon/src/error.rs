use thiserror::Error;

use crate::model::TableRole;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A required key column is absent from one of the inputs.
    #[error("{table}: missing column '{column}'")]
    MissingColumn { table: TableRole, column: String },

    /// Suffixing colliding names still produced a duplicate output column.
    #[error("output column '{column}' is ambiguous after suffixing")]
    ColumnCollision { column: String },

    /// A table was built with the same column name twice.
    #[error("duplicate column name '{column}'")]
    DuplicateColumn { column: String },

    /// A table row does not have one value per column.
    #[error("row {row}: expected {expected} value(s), found {found}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Options are well-formed TOML but semantically invalid.
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

impl ResolveError {
    /// True for errors caused by the shape of the input tables.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. }
                | Self::ColumnCollision { .. }
                | Self::DuplicateColumn { .. }
                | Self::RaggedRow { .. }
        )
    }
}
