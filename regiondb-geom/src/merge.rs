//! Sibling union with a fast/robust fallback chain.
//!
//! The aggregator combines the geometries of one division's direct children
//! into the parent's boundary. Two strategies:
//!
//! - **fast**: assumes well-formed input. Every child is validity-checked up
//!   front; any invalid child fails the whole attempt so the caller can fall
//!   back instead of unioning garbage.
//! - **robust**: repairs each child ring-by-ring first, then unions whatever
//!   survives.
//!
//! [`merge_with_fallback`] chains the two and reports which path produced
//! the result.

use crate::error::{GeomError, Result};
use crate::repair::repair;
use geo::{BooleanOps, Validation};
use geo_types::MultiPolygon;

/// Which merge strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePath {
    /// Topology-assuming fast union of the inputs as-is.
    Fast,
    /// Repair-first union.
    Robust,
}

impl MergePath {
    pub fn label(self) -> &'static str {
        match self {
            MergePath::Fast => "fast",
            MergePath::Robust => "robust",
        }
    }
}

/// Fold a union over all inputs. Input order does not affect the result
/// beyond floating-point association, and the inputs are always presented
/// in a stable order by the caller, so the output is deterministic.
fn union_all(children: &[MultiPolygon<f64>]) -> Result<MultiPolygon<f64>> {
    let mut iter = children.iter();
    let first = iter.next().ok_or(GeomError::EmptyInput)?;
    let mut merged = first.clone();
    for next in iter {
        merged = merged.union(next);
    }
    Ok(merged)
}

/// Fast path: refuse invalid inputs, then union.
pub fn merge_fast(children: &[MultiPolygon<f64>]) -> Result<MultiPolygon<f64>> {
    for (i, child) in children.iter().enumerate() {
        if !child.is_valid() {
            return Err(GeomError::InvalidGeometry(format!(
                "child geometry {} is not valid",
                i
            )));
        }
    }
    union_all(children)
}

/// Robust path: repair every child, drop the irreparable, union the rest.
pub fn merge_robust(children: &[MultiPolygon<f64>]) -> Result<MultiPolygon<f64>> {
    let repaired: Vec<MultiPolygon<f64>> = children
        .iter()
        .map(repair)
        .filter(|mp| !mp.0.is_empty())
        .collect();
    if repaired.is_empty() {
        return Err(GeomError::MergeFailed(
            "no child geometry survived repair".into(),
        ));
    }
    union_all(&repaired)
}

/// Merge with the fast path, falling back to the robust path on failure.
pub fn merge_with_fallback(children: &[MultiPolygon<f64>]) -> Result<(MultiPolygon<f64>, MergePath)> {
    if children.is_empty() {
        return Err(GeomError::EmptyInput);
    }
    match merge_fast(children) {
        Ok(merged) => Ok((merged, MergePath::Fast)),
        Err(fast_err) => match merge_robust(children) {
            Ok(merged) => Ok((merged, MergePath::Robust)),
            Err(robust_err) => Err(GeomError::MergeFailed(format!(
                "fast path: {}; robust path: {}",
                fast_err, robust_err
            ))),
        },
    }
}
