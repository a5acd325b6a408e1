//! WKT parsing and emission.
//!
//! Stored geometry is WKT text; parsing happens when an operation needs
//! coordinates, emission when a result is written back.

use crate::error::{GeomError, Result};
use geo_types::{Geometry, MultiPolygon, Polygon};
use wkt::ToWkt;

/// Parse a WKT string into a geo-types geometry.
pub fn parse_wkt(wkt: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(wkt)
        .map_err(|e| GeomError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| GeomError::WktParse(format!("{:?}", e)))
        })
}

/// Emit a multipolygon as WKT.
pub fn to_wkt(geom: &MultiPolygon<f64>) -> String {
    geom.wkt_string()
}

/// Coerce a geometry into a multipolygon, keeping only areal components.
///
/// Single polygons are wrapped; collections contribute their polygonal
/// members and drop the rest. Anything with no areal component is an error,
/// since division boundaries are areas by definition.
pub fn into_multi_polygon(geom: Geometry<f64>) -> Result<MultiPolygon<f64>> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    collect_polygons(geom, &mut polys)?;
    if polys.is_empty() {
        return Err(GeomError::NotAreal(
            "geometry has no polygonal component".into(),
        ));
    }
    Ok(MultiPolygon(polys))
}

fn collect_polygons(geom: Geometry<f64>, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    match geom {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::GeometryCollection(gc) => {
            for member in gc.0 {
                collect_polygons(member, out)?;
            }
        }
        // Points and lines carry no area; dropped.
        _ => {}
    }
    Ok(())
}

/// Parse WKT directly into a multipolygon.
pub fn parse_multi_polygon(wkt: &str) -> Result<MultiPolygon<f64>> {
    into_multi_polygon(parse_wkt(wkt)?)
}
