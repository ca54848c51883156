/// Errors raised when building or extending a [`Table`](crate::Table).
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Column '{column}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),
}
