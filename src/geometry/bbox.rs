// src/geometry/bbox.rs
use std::path::Path;

use gdal::Dataset;

use super::reproject::{traditional_order, transform_point, Crs, Reprojector};
use super::wkt::wkt_to_bounds;
use crate::error::{NdviError, Result};

/// Axis-aligned rectangle `(min_lon, min_lat, max_lon, max_lat)`.
///
/// "lon"/"lat" name the x/y axes; in a projected CRS they hold eastings and
/// northings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Box spanned by two opposite corners given in any order.
    pub fn from_corners((x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> Self {
        Self::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, lon, lat)
    }

    pub fn is_point(&self) -> bool {
        self.min_lon == self.max_lon && self.min_lat == self.max_lat
    }

    /// Closed five-vertex `POLYGON` ring.
    pub fn to_wkt(&self) -> String {
        bounds_to_wkt(self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }

    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let crs = Crs::wgs84();
        wkt_to_bounds(wkt, &crs, &crs)
    }

    /// Inclusive on every edge.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.min_lat <= lat && lat <= self.max_lat && self.min_lon <= lon && lon <= self.max_lon
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    /// Reprojects the lower-left and upper-right corners only.
    pub fn reproject(&self, src: &Crs, dst: &Crs) -> Result<Self> {
        if src == dst {
            return Ok(*self);
        }
        let reprojector = Reprojector::between(src, dst)?;
        Ok(Self::from_corners(
            reprojector.point(self.min_lon, self.min_lat)?,
            reprojector.point(self.max_lon, self.max_lat)?,
        ))
    }
}

pub fn bounds_to_wkt(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> String {
    format!(
        "POLYGON (({min_lon} {min_lat}, {max_lon} {min_lat}, {max_lon} {max_lat}, {min_lon} {max_lat}, {min_lon} {min_lat}))"
    )
}

/// Native `(left, bottom, right, top)` of a north-up raster.
pub fn raster_bounds(dataset: &Dataset) -> Result<(f64, f64, f64, f64)> {
    let gt = dataset.geo_transform()?;
    let (width, height) = dataset.raster_size();
    let x0 = gt[0];
    let y0 = gt[3];
    let x1 = gt[0] + width as f64 * gt[1] + height as f64 * gt[2];
    let y1 = gt[3] + width as f64 * gt[4] + height as f64 * gt[5];
    Ok((x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
}

/// Raster footprint in `target`, from its two reprojected corners.
pub fn bounding_box_of(dataset: &Dataset, target: &Crs) -> Result<BoundingBox> {
    let (left, bottom, right, top) = raster_bounds(dataset)?;
    let source = dataset
        .spatial_ref()
        .map_err(|e| NdviError::Validation(format!("raster has no usable CRS: {e}")))?;
    let reprojector = Reprojector::new(&traditional_order(source), &target.spatial_ref()?)?;
    Ok(BoundingBox::from_corners(
        reprojector.point(left, bottom)?,
        reprojector.point(right, top)?,
    ))
}

pub fn bounding_box_of_path(path: &Path, target: &Crs) -> Result<BoundingBox> {
    let dataset = Dataset::open(path).map_err(|e| NdviError::io(path, e))?;
    bounding_box_of(&dataset, target)
}

/// Reprojects the point into `target_crs` when `crs` differs, then tests
/// inclusive containment.
pub fn point_in_box(
    lat: f64,
    lon: f64,
    bbox: &BoundingBox,
    crs: &Crs,
    target_crs: &Crs,
) -> Result<bool> {
    let (lon, lat) = transform_point(lon, lat, crs, target_crs)?;
    Ok(bbox.contains(lon, lat))
}

/// Envelope of the query geometry against `bbox`.
pub fn boxes_overlap(
    query_wkt: &str,
    bbox: &BoundingBox,
    crs: &Crs,
    target_crs: &Crs,
) -> Result<bool> {
    let query = wkt_to_bounds(query_wkt, crs, target_crs)?;
    Ok(bbox.intersects(&query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wkt_round_trip_is_exact() {
        let cases = [
            (10.0, 50.0, 14.0, 54.0),
            (-122.419_415_5, 37.774_929_1, -122.3, 37.9),
            (0.1, 1e-7, 0.30000000000000004, 0.2),
        ];
        for (a, b, c, d) in cases {
            let back = BoundingBox::from_wkt(&bounds_to_wkt(a, b, c, d)).unwrap();
            assert_eq!(back, BoundingBox::new(a, b, c, d));
        }
    }

    #[test]
    fn wkt_ring_is_closed() {
        let wkt = BoundingBox::new(1.0, 2.0, 3.0, 4.0).to_wkt();
        assert_eq!(wkt, "POLYGON ((1 2, 3 2, 3 4, 1 4, 1 2))");
    }

    #[test]
    fn corners_are_inside_and_outside_is_not() {
        let wgs84 = Crs::wgs84();
        let bbox = BoundingBox::new(10.0, 50.0, 14.0, 54.0);
        for (lat, lon) in [(50.0, 10.0), (54.0, 14.0), (50.0, 14.0), (54.0, 10.0)] {
            assert!(point_in_box(lat, lon, &bbox, &wgs84, &wgs84).unwrap());
        }
        for (lat, lon) in [(49.999, 12.0), (54.001, 12.0), (52.0, 9.999), (52.0, 14.001)] {
            assert!(!point_in_box(lat, lon, &bbox, &wgs84, &wgs84).unwrap());
        }
    }

    #[test]
    fn lonlat_point_against_projected_box() {
        let wgs84 = Crs::wgs84();
        let utm = Crs::new("EPSG:32633");
        let bbox = BoundingBox::new(500_000.0, 5_796_000.0, 504_000.0, 5_800_000.0);

        let (lon, lat) = transform_point(502_000.0, 5_798_000.0, &utm, &wgs84).unwrap();
        assert!(point_in_box(lat, lon, &bbox, &wgs84, &utm).unwrap());

        let (lon, lat) = transform_point(510_000.0, 5_798_000.0, &utm, &wgs84).unwrap();
        assert!(!point_in_box(lat, lon, &bbox, &wgs84, &utm).unwrap());
    }

    #[test]
    fn overlap_is_separating_axis() {
        let wgs84 = Crs::wgs84();
        let bbox = BoundingBox::new(10.0, 50.0, 14.0, 54.0);
        let touching = "POLYGON ((14 54, 15 54, 15 55, 14 55, 14 54))";
        let inside = "POINT (12 52)";
        let apart = "POLYGON ((20 50, 21 50, 21 51, 20 51, 20 50))";
        assert!(boxes_overlap(touching, &bbox, &wgs84, &wgs84).unwrap());
        assert!(boxes_overlap(inside, &bbox, &wgs84, &wgs84).unwrap());
        assert!(!boxes_overlap(apart, &bbox, &wgs84, &wgs84).unwrap());
    }

    #[test]
    fn corners_are_ordered_after_reprojection() {
        let b = BoundingBox::from_corners((5.0, 9.0), (1.0, 3.0));
        assert_eq!(b, BoundingBox::new(1.0, 3.0, 5.0, 9.0));
        assert!(BoundingBox::point(1.0, 1.0).is_point());
    }
}
