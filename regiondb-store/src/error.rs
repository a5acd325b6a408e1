//! Error types for the store.

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing store unreachable (cannot open / cannot write the database).
    #[error("cannot open database at {path}: {source}")]
    Connectivity {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Malformed or missing input table/columns.
    #[error("source format error: {0}")]
    SourceFormat(String),

    /// Any other SQLite-level failure.
    #[error("store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
