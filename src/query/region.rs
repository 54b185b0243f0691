// src/query/region.rs
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info_span, warn};

use super::catalog::{date_directories, load_catalog};
use super::extract::clip_values;
use super::{DateRange, QueryOptions};
use crate::error::Result;
use crate::geometry::wkt::{envelope_of, parse_geometry};
use crate::utils::{denormalize, summarize, Summary};

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub date: NaiveDate,
    pub summary: Summary,
    /// Pixels pooled for this date.
    pub samples: usize,
}

impl RegionRecord {
    pub fn from_pool(date: NaiveDate, pool: &[u8]) -> Self {
        Self {
            date,
            summary: summarize_pool(pool),
            samples: pool.len(),
        }
    }
}

/// Denormalizes stored bytes and summarizes them; all NaN for an empty pool.
pub fn summarize_pool(pool: &[u8]) -> Summary {
    let values: Vec<f64> = pool.iter().map(|&v| denormalize(v as f64)).collect();
    summarize(&values)
}

/// Min/max/median/mean NDVI inside `wkt` for every date directory in
/// `range`. Every date yields a row, with NaN statistics when nothing
/// overlapped.
pub fn timeseries_range(
    wkt: &str,
    range: &DateRange,
    root: &Path,
    options: &QueryOptions,
) -> Result<Vec<RegionRecord>> {
    let (geometry, _) = parse_geometry(wkt)?;
    let query_box = envelope_of(&geometry).reproject(&options.query_crs, &options.index_crs)?;

    let mut records = Vec::new();
    for dir in date_directories(root, range)? {
        let span = info_span!("date", date = %dir.date);
        let _guard = span.enter();

        let mut pool: Vec<u8> = Vec::new();
        match load_catalog(&dir.path, &options.index_file) {
            Ok(catalog) => {
                for raster in catalog.iter().filter(|r| r.bbox.intersects(&query_box)) {
                    match clip_values(&raster.path, &geometry, &options.query_crs) {
                        Ok(values) => {
                            debug!(file = %raster.file_name, pixels = values.len(), "clipped");
                            pool.extend(values);
                        }
                        Err(e) => warn!(file = %raster.file_name, error = %e, "error clipping raster"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "no usable index for date"),
        }
        records.push(RegionRecord::from_pool(dir.date, &pool));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_values_are_denormalized() {
        let s = summarize_pool(&[30, 10, 20]);
        assert_eq!(s.min, denormalize(10.0));
        assert_eq!(s.max, denormalize(30.0));
        assert_eq!(s.median, denormalize(20.0));
        assert!((s.mean - denormalize(20.0)).abs() < 1e-12);
    }

    #[test]
    fn empty_pool_is_nan_row() {
        let date = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let record = RegionRecord::from_pool(date, &[]);
        assert_eq!(record.samples, 0);
        assert!(record.summary.is_empty());
    }
}
