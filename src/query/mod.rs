// src/query/mod.rs
//! Time-series queries over a directory-of-dates tree produced by the batch
//! indexer.
pub mod catalog;
pub mod extract;
pub mod output;
pub mod point;
pub mod region;

use chrono::NaiveDate;

use crate::geometry::Crs;
use crate::io::INDEX_FILE_NAME;

pub use catalog::{date_directories, load_catalog, DateDirectory, IndexedRaster};
pub use point::{timeseries_point, PointRecord};
pub use region::{timeseries_range, RegionRecord};

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// How far a point query scans once a date has produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointScan {
    /// At most one record per date.
    #[default]
    PerDate,
    /// Stop at the first date that matches; at most one record overall.
    FirstMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// CRS of query points and geometries.
    pub query_crs: Crs,
    /// CRS the index bounding boxes are stored in.
    pub index_crs: Crs,
    pub index_file: String,
    pub point_scan: PointScan,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            query_crs: Crs::wgs84(),
            index_crs: Crs::wgs84(),
            index_file: INDEX_FILE_NAME.to_string(),
            point_scan: PointScan::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let range = DateRange::new(d("2021-03-01"), d("2021-03-31"));
        assert!(range.contains(d("2021-03-01")));
        assert!(range.contains(d("2021-03-31")));
        assert!(!range.contains(d("2021-04-01")));
        assert!(!range.contains(d("2021-02-28")));
    }
}
