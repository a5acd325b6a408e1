//! Staged adaptive simplification.
//!
//! Merged boundaries for large divisions (continents, big federations) can
//! carry millions of vertices. The aggregator simplifies such results with a
//! tolerance picked from a staged table keyed by point-count bucket: finer
//! tolerance for moderate complexity, coarser for extreme complexity. All
//! simplification is topology-preserving (Visvalingam-Whyatt with
//! intersection prevention), so no self-intersections are introduced.
//!
//! Separately, every stored geometry gets two pre-simplified display
//! variants at fixed tolerances, written alongside the full-resolution
//! source whenever `geom` is written.

use crate::point_count;
use crate::wkt_io::to_wkt;
use geo::SimplifyVwPreserve;
use geo_types::MultiPolygon;

/// Display-variant tolerance for low zoom, in degrees.
pub const DISPLAY_TOLERANCE_LOW: f64 = 0.1;
/// Display-variant tolerance for medium zoom, in degrees.
pub const DISPLAY_TOLERANCE_MEDIUM: f64 = 0.01;

/// One bucket of the staged simplification table: results with at most
/// `max_points` coordinates get `tolerance` (0.0 means untouched).
#[derive(Debug, Clone, Copy)]
pub struct SimplifyStage {
    pub max_points: usize,
    pub tolerance: f64,
}

/// Default staged table. The first bucket leaves moderate results at full
/// resolution; beyond it, tolerance grows with complexity.
pub fn default_stages() -> Vec<SimplifyStage> {
    vec![
        SimplifyStage {
            max_points: 100_000,
            tolerance: 0.0,
        },
        SimplifyStage {
            max_points: 300_000,
            tolerance: 0.0001,
        },
        SimplifyStage {
            max_points: 1_000_000,
            tolerance: 0.0005,
        },
        SimplifyStage {
            max_points: usize::MAX,
            tolerance: 0.001,
        },
    ]
}

/// Simplify a merged result according to the staged table.
///
/// Returns the (possibly untouched) geometry and the tolerance applied, if
/// any. Stages are consulted in order; the first bucket that admits the
/// point count wins.
pub fn simplify_staged(
    geom: &MultiPolygon<f64>,
    stages: &[SimplifyStage],
) -> (MultiPolygon<f64>, Option<f64>) {
    let points = point_count(geom);
    let stage = stages.iter().find(|s| points <= s.max_points);
    match stage {
        Some(s) if s.tolerance > 0.0 => {
            (geom.simplify_vw_preserve(&s.tolerance), Some(s.tolerance))
        }
        _ => (geom.clone(), None),
    }
}

/// Compute the low/medium display variants of a geometry as WKT.
pub fn display_variants(geom: &MultiPolygon<f64>) -> (String, String) {
    let low = geom.simplify_vw_preserve(&DISPLAY_TOLERANCE_LOW);
    let medium = geom.simplify_vw_preserve(&DISPLAY_TOLERANCE_MEDIUM);
    (to_wkt(&low), to_wkt(&medium))
}
