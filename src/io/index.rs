// src/io/index.rs
//! Per-date raster index persisted as `raster_index.csv`.
//!
//! Layout is `,FileName,MBR` with a leading row-number column; the MBR cell
//! holds a WKT `POLYGON`. An index file is written at most once.
use std::fs::File;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{NdviError, Result};
use crate::geometry::BoundingBox;

pub const INDEX_FILE_NAME: &str = "raster_index.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterIndexEntry {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "MBR")]
    pub mbr: String,
}

impl RasterIndexEntry {
    pub fn new(file_name: impl Into<String>, mbr: &BoundingBox) -> Self {
        Self {
            file_name: file_name.into(),
            mbr: mbr.to_wkt(),
        }
    }

    pub fn bounding_box(&self) -> Result<BoundingBox> {
        BoundingBox::from_wkt(&self.mbr)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterIndex {
    entries: Vec<RasterIndexEntry>,
}

impl RasterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file_name: impl Into<String>, mbr: &BoundingBox) {
        self.entries.push(RasterIndexEntry::new(file_name, mbr));
    }

    pub fn entries(&self) -> &[RasterIndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the index unless `path` already exists. Returns whether a file
    /// was written.
    ///
    /// Rows go to a temporary file next to `path` that is moved into place
    /// only once complete, so a failed write never leaves a partial index.
    pub fn write_once(&self, path: &Path) -> Result<bool> {
        commit_once(path, |file| {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(["", "FileName", "MBR"])?;
            for (row, entry) in self.entries.iter().enumerate() {
                let row = row.to_string();
                writer.write_record([row.as_str(), entry.file_name.as_str(), entry.mbr.as_str()])?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(NdviError::NotFound(path.to_path_buf()));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let entries = reader
            .deserialize::<RasterIndexEntry>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }
}

impl<'a> IntoIterator for &'a RasterIndex {
    type Item = &'a RasterIndexEntry;
    type IntoIter = std::slice::Iter<'a, RasterIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Runs `fill` against a temporary file in `path`'s directory and links the
/// result to `path` unless something is already there.
fn commit_once<F>(path: &Path, fill: F) -> Result<bool>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    if path.exists() {
        return Ok(false);
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| NdviError::io(dir, e))?;

    // tmp is removed on drop, including on this early return
    fill(tmp.as_file_mut())?;
    tmp.as_file().sync_all().map_err(|e| NdviError::io(tmp.path(), e))?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == IoErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(NdviError::io(path, e.error)),
    }
}
