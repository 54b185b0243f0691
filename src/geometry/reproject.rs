// src/geometry/reproject.rs
use std::fmt;
use std::str::FromStr;

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};

use crate::error::{NdviError, Result};

/// A coordinate reference system identified by any definition GDAL accepts
/// (`EPSG:4326`, PROJ strings, WKT). Two CRS values are the same when their
/// definitions are textually equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    pub const WGS84: &'static str = "EPSG:4326";

    pub fn new(definition: impl Into<String>) -> Self {
        Crs(definition.into())
    }

    pub fn wgs84() -> Self {
        Crs(Self::WGS84.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Spatial reference with x = longitude/easting, y = latitude/northing.
    pub fn spatial_ref(&self) -> Result<SpatialRef> {
        let srs = SpatialRef::from_definition(&self.0)
            .map_err(|e| NdviError::Format(format!("unknown CRS '{}': {e}", self.0)))?;
        Ok(traditional_order(srs))
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::wgs84()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Crs {
    type Err = NdviError;

    fn from_str(s: &str) -> Result<Self> {
        let crs = Crs::new(s.trim());
        crs.spatial_ref()?;
        Ok(crs)
    }
}

impl From<&str> for Crs {
    fn from(s: &str) -> Self {
        Crs::new(s)
    }
}

pub fn traditional_order(mut srs: SpatialRef) -> SpatialRef {
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    srs
}

/// Point transformer between two spatial references.
pub struct Reprojector {
    transform: CoordTransform,
}

impl Reprojector {
    pub fn new(src: &SpatialRef, dst: &SpatialRef) -> Result<Self> {
        Ok(Self {
            transform: CoordTransform::new(src, dst)?,
        })
    }

    pub fn between(src: &Crs, dst: &Crs) -> Result<Self> {
        Self::new(&src.spatial_ref()?, &dst.spatial_ref()?)
    }

    pub fn transform(&self) -> &CoordTransform {
        &self.transform
    }

    pub fn point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut xs = [x];
        let mut ys = [y];
        self.transform.transform_coords(&mut xs, &mut ys, &mut [])?;
        Ok((xs[0], ys[0]))
    }
}

/// Identity when both CRS are the same.
pub fn transform_point(x: f64, y: f64, src: &Crs, dst: &Crs) -> Result<(f64, f64)> {
    if src == dst {
        return Ok((x, y));
    }
    Reprojector::between(src, dst)?.point(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_crs_is_identity() {
        let crs = Crs::wgs84();
        assert_eq!(transform_point(12.5, 41.9, &crs, &crs).unwrap(), (12.5, 41.9));
    }

    #[test]
    fn wgs84_to_web_mercator_keeps_lon_first() {
        let (x, y) = transform_point(0.0, 0.0, &Crs::wgs84(), &Crs::new("EPSG:3857")).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);

        let (x, _) = transform_point(180.0, 0.0, &Crs::wgs84(), &Crs::new("EPSG:3857")).unwrap();
        assert!((x - 20_037_508.342789244).abs() < 1e-3);
    }

    #[test]
    fn rejects_unknown_definitions() {
        assert!("EPSG:not-a-code".parse::<Crs>().is_err());
        assert_eq!("EPSG:32633".parse::<Crs>().unwrap().as_str(), "EPSG:32633");
    }
}
