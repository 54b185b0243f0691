// src/query/catalog.rs
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::DateRange;
use crate::error::{NdviError, Result};
use crate::geometry::BoundingBox;
use crate::io::writer::with_tif_extension;
use crate::io::RasterIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDirectory {
    pub date: NaiveDate,
    pub path: PathBuf,
}

/// An index row resolved to a raster on disk and its parsed bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRaster {
    pub file_name: String,
    pub path: PathBuf,
    pub bbox: BoundingBox,
}

pub fn parse_date_dir(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, "%Y-%m-%d").ok()
}

/// Children of `root` named `YYYY-MM-DD` that fall in `range`, oldest first.
pub fn date_directories(root: &Path, range: &DateRange) -> Result<Vec<DateDirectory>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| NdviError::io(root, e))? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(date) = name.to_str().and_then(parse_date_dir) else {
            debug!(dir = %path.display(), "not a date directory, ignored");
            continue;
        };
        if range.contains(date) {
            dirs.push(DateDirectory { date, path });
        }
    }
    dirs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
    Ok(dirs)
}

/// Loads a directory's index. Rows with an unparseable MBR or no raster on
/// disk are skipped.
pub fn load_catalog(dir: &Path, index_file: &str) -> Result<Vec<IndexedRaster>> {
    let index = RasterIndex::load(&dir.join(index_file))?;

    let mut rasters = Vec::with_capacity(index.len());
    for entry in &index {
        let bbox = match entry.bounding_box() {
            Ok(bbox) => bbox,
            Err(e) => {
                warn!(file = %entry.file_name, error = %e, "bad MBR in index");
                continue;
            }
        };
        let path = with_tif_extension(&dir.join(&entry.file_name));
        if !path.is_file() {
            debug!(file = %entry.file_name, "indexed raster missing on disk");
            continue;
        }
        rasters.push(IndexedRaster {
            file_name: entry.file_name.clone(),
            path,
            bbox,
        });
    }
    Ok(rasters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn only_in_range_dates_sorted() {
        let root = TempDir::new().unwrap();
        for name in ["2020-03-01", "2020-01-15", "2019-12-31", "misc", "2020-02-30"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        fs::write(root.path().join("2020-02-01"), b"a file, not a dir").unwrap();

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        );
        let dates: Vec<String> = date_directories(root.path(), &range)
            .unwrap()
            .into_iter()
            .map(|d| d.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2020-01-15", "2020-03-01"]);
    }

    #[test]
    fn catalog_skips_bad_rows_and_missing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("present.tif"), b"").unwrap();
        fs::write(
            dir.path().join("raster_index.csv"),
            ",FileName,MBR\n\
             0,present,\"POLYGON ((1 2, 3 2, 3 4, 1 4, 1 2))\"\n\
             1,absent,\"POLYGON ((1 2, 3 2, 3 4, 1 4, 1 2))\"\n\
             2,present,LINESTRING (0 0)\n",
        )
        .unwrap();

        let catalog = load_catalog(dir.path(), "raster_index.csv").unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].path, dir.path().join("present.tif"));
        assert_eq!(catalog[0].bbox, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
    }
}
