// src/query/output.rs
//! CSV files for query results.
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use super::point::PointRecord;
use super::region::RegionRecord;
use super::DateRange;
use crate::error::{NdviError, Result};
use crate::geometry::BoundingBox;

#[derive(Serialize)]
struct PointRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "File")]
    file: &'a str,
    #[serde(rename = "PixelValue")]
    pixel_value: f64,
}

/// NaN statistics are written as empty cells.
#[derive(Serialize)]
struct RegionRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "NDVI_MIN")]
    min: Option<f64>,
    #[serde(rename = "NDVI_MAX")]
    max: Option<f64>,
    #[serde(rename = "NDVI_MEDIAN")]
    median: Option<f64>,
    #[serde(rename = "NDVI_MEAN")]
    mean: Option<f64>,
}

fn non_nan(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

pub fn point_file_name(range: &DateRange, lat: f64, lon: f64) -> String {
    format!(
        "{}_to_{}_at_Longitude_{lon}_and_Latitude_{lat}.csv",
        range.start, range.end
    )
}

pub fn region_file_name(range: &DateRange, bbox: &BoundingBox) -> String {
    format!(
        "{}_to_{}_at_{}_{}_{}_{}.csv",
        range.start, range.end, bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
    )
}

fn writer_for(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| NdviError::io(path, e))
}

pub fn write_point_series(path: &Path, records: &[PointRecord]) -> Result<()> {
    let mut writer = writer_for(path)?;
    writer.write_record(["Date", "File", "PixelValue"])?;
    for record in records {
        writer.serialize(PointRow {
            date: record.date,
            file: &record.file,
            pixel_value: record.pixel_value,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_region_series(path: &Path, records: &[RegionRecord]) -> Result<()> {
    let mut writer = writer_for(path)?;
    writer.write_record(["Date", "NDVI_MIN", "NDVI_MAX", "NDVI_MEDIAN", "NDVI_MEAN"])?;
    for record in records {
        let s = &record.summary;
        writer.serialize(RegionRow {
            date: record.date,
            min: non_nan(s.min),
            max: non_nan(s.max),
            median: non_nan(s.median),
            mean: non_nan(s.mean),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Summary;
    use std::fs;
    use tempfile::TempDir;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
    }

    #[test]
    fn file_names_carry_query_parameters() {
        assert_eq!(
            point_file_name(&range(), 52.5, 11.25),
            "2020-01-01_to_2020-12-31_at_Longitude_11.25_and_Latitude_52.5.csv"
        );
        assert_eq!(
            region_file_name(&range(), &BoundingBox::new(10.0, 50.0, 14.5, 54.0)),
            "2020-01-01_to_2020-12-31_at_10_50_14.5_54.csv"
        );
    }

    #[test]
    fn region_nan_written_as_empty_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![
            RegionRecord {
                date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
                summary: Summary { min: -0.5, max: 0.5, median: 0.0, mean: 0.25 },
                samples: 4,
            },
            RegionRecord {
                date: NaiveDate::from_ymd_opt(2020, 5, 17).unwrap(),
                summary: Summary::EMPTY,
                samples: 0,
            },
        ];
        write_region_series(&path, &records).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,NDVI_MIN,NDVI_MAX,NDVI_MEDIAN,NDVI_MEAN");
        assert_eq!(lines[1], "2020-05-01,-0.5,0.5,0.0,0.25");
        assert_eq!(lines[2], "2020-05-17,,,,");
    }

    #[test]
    fn empty_point_series_still_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.csv");
        write_point_series(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Date,File,PixelValue\n");
    }
}
