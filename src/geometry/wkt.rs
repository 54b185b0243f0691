// src/geometry/wkt.rs
use gdal::vector::Geometry;
use gdal_sys::OGRwkbGeometryType;

use super::bbox::BoundingBox;
use super::reproject::Crs;
use crate::error::{NdviError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Polygon,
}

/// Parses a `POINT` or `POLYGON` (2D, Z, M or ZM). Anything else is a format error.
pub fn parse_geometry(wkt: &str) -> Result<(Geometry, GeometryKind)> {
    let geometry = Geometry::from_wkt(wkt.trim())
        .map_err(|e| NdviError::Format(format!("invalid WKT: {e}")))?;

    if geometry.is_empty() {
        return Err(NdviError::Format("empty geometry".to_string()));
    }

    let kind = match geometry.geometry_type() {
        OGRwkbGeometryType::wkbPoint
        | OGRwkbGeometryType::wkbPoint25D
        | OGRwkbGeometryType::wkbPointM
        | OGRwkbGeometryType::wkbPointZM => GeometryKind::Point,
        OGRwkbGeometryType::wkbPolygon
        | OGRwkbGeometryType::wkbPolygon25D
        | OGRwkbGeometryType::wkbPolygonM
        | OGRwkbGeometryType::wkbPolygonZM => GeometryKind::Polygon,
        _ => {
            return Err(NdviError::Format(format!(
                "only POINT and POLYGON geometries are accepted, got {}",
                geometry.geometry_name()
            )))
        }
    };
    Ok((geometry, kind))
}

pub fn envelope_of(geometry: &Geometry) -> BoundingBox {
    let env = geometry.envelope();
    BoundingBox {
        min_lon: env.MinX,
        min_lat: env.MinY,
        max_lon: env.MaxX,
        max_lat: env.MaxY,
    }
}

/// Envelope of a `POLYGON`, or the degenerate box of a `POINT`, expressed in
/// `dst` (the two corners are reprojected when the CRS differ).
pub fn wkt_to_bounds(wkt: &str, src: &Crs, dst: &Crs) -> Result<BoundingBox> {
    let (geometry, _) = parse_geometry(wkt)?;
    envelope_of(&geometry).reproject(src, dst)
}
