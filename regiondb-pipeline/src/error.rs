//! Error types for the pipeline.

use regiondb_geom::GeomError;
use regiondb_store::StoreError;
use thiserror::Error;

/// Pipeline errors.
///
/// `Geometry` is the only recoverable variant: a division whose merge fails
/// is logged and skipped while its siblings continue. Everything else aborts
/// the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or missing input table/columns.
    #[error("source format error: {0}")]
    SourceFormat(String),

    /// Backing store unreachable.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Geometry processing failed for one division.
    #[error("geometry failure for division {id} ({name}): {source}")]
    Geometry {
        id: i64,
        name: String,
        #[source]
        source: GeomError,
    },

    /// Store-level failure.
    #[error(transparent)]
    Store(StoreError),

    /// An invariant the pipeline relies on does not hold.
    #[error("consistency error: {0}")]
    Consistency(String),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SourceFormat(msg) => PipelineError::SourceFormat(msg),
            StoreError::Connectivity { ref path, ref source } => {
                PipelineError::Connectivity(format!("{path}: {source}"))
            }
            other => PipelineError::Store(other),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
