//! Geometry operations for regiondb.
//!
//! This crate wraps the `geo` ecosystem behind the handful of operations the
//! aggregation pipeline needs: WKT parse/emit, validity checking, ring-level
//! repair, sibling union with a fast/robust fallback chain, and staged
//! topology-preserving simplification.
//!
//! # Design
//!
//! WKT text is the source of truth for stored geometry. All operations here
//! are deterministic: the same inputs produce the same output coordinates,
//! which makes re-running aggregation byte-comparable on the stored text.
//!
//! The fallback chain mirrors the two merge strategies of the store layer it
//! replaced: a fast union that refuses invalid inputs up front, and a robust
//! union that repairs each input ring-by-ring first.
//!
//! # Modules
//!
//! - [`wkt_io`]: WKT parsing and emission, multipolygon coercion
//! - [`repair`]: ring-level cleanup for malformed polygons
//! - [`merge`]: sibling union with the fast/robust fallback chain
//! - [`simplify`]: staged adaptive simplification and display variants
//! - [`error`]: error types

pub mod error;
pub mod merge;
pub mod repair;
pub mod simplify;
pub mod wkt_io;

pub use error::{GeomError, Result};
pub use merge::{merge_with_fallback, MergePath};
pub use repair::repair;
pub use simplify::{
    default_stages, display_variants, simplify_staged, SimplifyStage, DISPLAY_TOLERANCE_LOW,
    DISPLAY_TOLERANCE_MEDIUM,
};
pub use wkt_io::{into_multi_polygon, parse_multi_polygon, parse_wkt, to_wkt};

// Re-exported so downstream crates don't need a direct geo-types dependency.
pub use geo_types::{Geometry, MultiPolygon};

use geo::CoordsIter;

/// Total coordinate count of a multipolygon (all rings).
pub fn point_count(geom: &MultiPolygon<f64>) -> usize {
    geom.coords_count()
}
