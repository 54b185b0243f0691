// src/query/point.rs
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, info_span, warn};

use super::catalog::{date_directories, load_catalog, IndexedRaster};
use super::extract::pixel_at;
use super::{DateRange, PointScan, QueryOptions};
use crate::error::Result;
use crate::geometry::point_in_box;
use crate::utils::{denormalize, NODATA};

#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub date: NaiveDate,
    /// Raster file name including its extension.
    pub file: String,
    /// Denormalized NDVI.
    pub pixel_value: f64,
    pub raw_value: u8,
}

/// NDVI at a latitude/longitude for each date directory in `range`.
///
/// Within a date the first indexed raster whose box contains the point and
/// whose stored value is not no-data wins. With [`PointScan::FirstMatch`] the
/// scan also stops after the first date that yields a value.
pub fn timeseries_point(
    lat: f64,
    lon: f64,
    range: &DateRange,
    root: &Path,
    options: &QueryOptions,
) -> Result<Vec<PointRecord>> {
    let mut records = Vec::new();

    for dir in date_directories(root, range)? {
        let span = info_span!("date", date = %dir.date);
        let _guard = span.enter();

        let catalog = match load_catalog(&dir.path, &options.index_file) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "skipping date");
                continue;
            }
        };

        if let Some((raster, raw_value)) = first_hit(&catalog, lat, lon, options) {
            info!(file = %raster.file_name, value = raw_value, "point found");
            records.push(PointRecord {
                date: dir.date,
                file: raster
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| raster.file_name.clone()),
                pixel_value: denormalize(raw_value as f64),
                raw_value,
            });
            if options.point_scan == PointScan::FirstMatch {
                break;
            }
        }
    }
    Ok(records)
}

fn first_hit<'a>(
    catalog: &'a [IndexedRaster],
    lat: f64,
    lon: f64,
    options: &QueryOptions,
) -> Option<(&'a IndexedRaster, u8)> {
    for raster in catalog {
        match point_in_box(lat, lon, &raster.bbox, &options.query_crs, &options.index_crs) {
            Ok(true) => {}
            Ok(false) => {
                debug!(file = %raster.file_name, "point not in raster");
                continue;
            }
            Err(e) => {
                warn!(file = %raster.file_name, error = %e, "error testing raster");
                continue;
            }
        }

        match pixel_at(&raster.path, lat, lon, &options.query_crs) {
            Ok(Some(value)) if value != NODATA => return Some((raster, value)),
            Ok(Some(_)) => debug!(file = %raster.file_name, "no data at point"),
            Ok(None) => debug!(file = %raster.file_name, "point outside raster grid"),
            Err(e) => warn!(file = %raster.file_name, error = %e, "error reading raster"),
        }
    }
    None
}
