//! Error types for the store layer.

use thiserror::Error;

use galleria_query::QueryError;

/// The primary error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The search query failed to compile.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The logical table name is not part of the archive.
    #[error("unknown table: {name}")]
    UnknownTable { name: String },

    /// An error from the SQLite layer.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error while inspecting the database file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
