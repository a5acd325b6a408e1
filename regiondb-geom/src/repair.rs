//! Ring-level repair for malformed polygons.
//!
//! The robust merge path runs every child geometry through [`repair`] before
//! unioning. Repair is lossy on purpose: rings that cannot enclose area
//! (too few distinct coordinates, zero area, non-finite coordinates) are
//! dropped rather than patched, and surviving rings are re-closed and
//! re-oriented to the standard winding.

use geo::orient::{Direction, Orient};
use geo::Area;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};

/// Repair a multipolygon by cleaning each ring and dropping the ones that
/// cannot form a valid area. Polygons whose exterior does not survive are
/// removed entirely (their holes are meaningless without a shell).
pub fn repair(geom: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let mut polys = Vec::with_capacity(geom.0.len());
    for poly in &geom.0 {
        let Some(exterior) = clean_ring(poly.exterior()) else {
            continue;
        };
        let interiors: Vec<LineString<f64>> =
            poly.interiors().iter().filter_map(clean_ring).collect();
        polys.push(Polygon::new(exterior, interiors).orient(Direction::Default));
    }
    MultiPolygon(polys)
}

/// Clean one ring: strip non-finite and consecutive duplicate coordinates,
/// re-close, and reject rings without positive area.
fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = ring
        .coords()
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .copied()
        .collect();
    coords.dedup();

    // Drop a closing duplicate so the length check counts distinct vertices.
    if coords.len() >= 2 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }

    let mut ring = LineString::from(coords);
    ring.close();

    if Polygon::new(ring.clone(), Vec::new()).unsigned_area() == 0.0 {
        return None;
    }
    Some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wkt_io::parse_multi_polygon;

    #[test]
    fn valid_polygon_survives() {
        let mp = parse_multi_polygon("POLYGON((0 0, 2 0, 2 2, 0 2, 0 0))").unwrap();
        let repaired = repair(&mp);
        assert_eq!(repaired.0.len(), 1);
    }

    #[test]
    fn degenerate_ring_is_dropped() {
        // A "polygon" collapsed onto a line has zero area.
        let mp = parse_multi_polygon(
            "MULTIPOLYGON(((0 0, 1 0, 2 0, 0 0)), ((0 0, 2 0, 2 2, 0 2, 0 0)))",
        )
        .unwrap();
        let repaired = repair(&mp);
        assert_eq!(repaired.0.len(), 1);
    }

    #[test]
    fn duplicate_coords_are_deduped() {
        let mp =
            parse_multi_polygon("POLYGON((0 0, 0 0, 2 0, 2 0, 2 2, 0 2, 0 0, 0 0))").unwrap();
        let repaired = repair(&mp);
        assert_eq!(repaired.0.len(), 1);
        // Exterior keeps its four distinct corners plus the closing coord.
        assert_eq!(repaired.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn everything_degenerate_yields_empty() {
        let mp = parse_multi_polygon("MULTIPOLYGON(((0 0, 1 1, 2 2, 0 0)))").unwrap();
        let repaired = repair(&mp);
        assert!(repaired.0.is_empty());
    }
}
