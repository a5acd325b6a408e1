//! Per-division aggregate computation.
//!
//! One division at a time: load the direct children's stored WKT, union them
//! through the fast/robust fallback chain, simplify the result according to
//! the staged tolerance table, and persist it together with its display
//! variants in one guarded write.

use crate::error::{PipelineError, Result};
use regiondb_geom::{
    default_stages, display_variants, merge_with_fallback, parse_multi_polygon, point_count,
    simplify_staged, to_wkt, MergePath, SimplifyStage,
};
use regiondb_store::{DivisionStore, GeometryColumns};
use tracing::{debug, warn};

/// Tunables for the aggregation phase.
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Worker threads per depth level.
    pub workers: usize,
    /// Staged simplification table applied to merge results.
    pub stages: Vec<SimplifyStage>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            stages: default_stages(),
        }
    }
}

/// What happened to one scheduled division.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOutcome {
    /// Geometry computed and persisted.
    Merged {
        path: MergePath,
        points_before: usize,
        points_after: usize,
    },
    /// No child had geometry yet; left pending for a later run.
    NoChildren,
    /// The guarded write found the division already resolved (written by an
    /// earlier interrupted run, or no longer an internal node).
    Stale,
}

/// Compute and persist the aggregate geometry of one division.
pub fn aggregate_division(
    store: &DivisionStore,
    id: i64,
    name: &str,
    stages: &[SimplifyStage],
) -> Result<AggregateOutcome> {
    let child_wkts = store.children_geometries(id)?;
    if child_wkts.is_empty() {
        warn!(id, name, "no child geometry available, left pending");
        return Ok(AggregateOutcome::NoChildren);
    }

    let mut children = Vec::with_capacity(child_wkts.len());
    for wkt in &child_wkts {
        children.push(parse_multi_polygon(wkt).map_err(|source| PipelineError::Geometry {
            id,
            name: name.to_string(),
            source,
        })?);
    }

    let (merged, path) =
        merge_with_fallback(&children).map_err(|source| PipelineError::Geometry {
            id,
            name: name.to_string(),
            source,
        })?;
    let points_before = point_count(&merged);

    let (simplified, tolerance) = simplify_staged(&merged, stages);
    let points_after = point_count(&simplified);
    if let Some(tolerance) = tolerance {
        debug!(
            id,
            name, points_before, points_after, tolerance, "merge result simplified"
        );
    }

    let geom = to_wkt(&simplified);
    let (low, medium) = display_variants(&simplified);
    let written = store.write_aggregate(
        id,
        GeometryColumns {
            geom: &geom,
            simplified_low: &low,
            simplified_medium: &medium,
        },
    )?;
    if !written {
        debug!(id, name, "aggregate already present, write skipped");
        return Ok(AggregateOutcome::Stale);
    }

    debug!(
        id,
        name,
        children = children.len(),
        merge_path = path.label(),
        points = points_after,
        "aggregate written"
    );
    Ok(AggregateOutcome::Merged {
        path,
        points_before,
        points_after,
    })
}
