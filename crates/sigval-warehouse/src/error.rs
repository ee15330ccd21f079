use sigval_core::{CatalogError, PackError, ResultKind, ValidationError};
use thiserror::Error;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no stored result with id {id}")]
    NotFound { id: i64 },

    #[error("stored result {id} is a {found}, not a {expected}")]
    KindMismatch {
        id: i64,
        expected: ResultKind,
        found: ResultKind,
    },

    /// The stored rows do not form a valid container.
    #[error("stored result {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<WarehouseError> for CatalogError {
    fn from(error: WarehouseError) -> Self {
        CatalogError(error.to_string())
    }
}
