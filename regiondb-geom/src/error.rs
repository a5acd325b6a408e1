//! Error types for geometry operations.

use thiserror::Error;

/// Geometry operation errors.
#[derive(Debug, Error)]
pub enum GeomError {
    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Invalid geometry (e.g., self-intersecting or degenerate polygon).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Geometry contains no areal (polygonal) component.
    #[error("no areal component: {0}")]
    NotAreal(String),

    /// Merge was asked to combine zero geometries.
    #[error("no input geometries to merge")]
    EmptyInput,

    /// Both merge paths failed.
    #[error("merge failed: {0}")]
    MergeFailed(String),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
