// src/processing/directory.rs
//! One date subdirectory, end to end: pair bands, produce rasters, commit
//! the index.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{debug, error, info, warn};

use super::ndvi::compute_ndvi;
use crate::config::IndexerConfig;
use crate::error::{NdviError, Result};
use crate::geometry::{bounding_box_of_path, Crs};
use crate::io::{export_raster, read_band_pair, RasterIndex, WriteOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPairPaths {
    pub red: PathBuf,
    pub nir: PathBuf,
    pub base_name: String,
}

/// Outcome of processing one subdirectory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryReport {
    pub name: String,
    pub produced: usize,
    pub skipped_existing: usize,
    pub missing_nir: usize,
    pub failed: usize,
    pub indexed: usize,
    pub index_written: bool,
    /// Set when the whole directory was abandoned.
    pub error: Option<String>,
}

impl DirectoryReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn aborted(name: impl Into<String>, error: &NdviError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(name)
        }
    }
}

/// Red files by suffix, each paired with the NIR file sharing its base name.
/// Red files without a partner are logged and counted, not fatal.
pub fn pair_bands(dir: &Path, red_suffix: &str, nir_suffix: &str) -> Result<(Vec<BandPairPaths>, usize)> {
    let red_names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| NdviError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(red_suffix))
        .sorted()
        .collect();

    let mut pairs = Vec::with_capacity(red_names.len());
    let mut missing = 0;
    for red_name in red_names {
        let base_name = red_name[..red_name.len() - red_suffix.len()].to_string();
        let nir = dir.join(format!("{base_name}{nir_suffix}"));
        if nir.is_file() {
            pairs.push(BandPairPaths {
                red: dir.join(&red_name),
                nir,
                base_name,
            });
        } else {
            error!(file = %base_name, "NIR band missing, skipping this pair");
            missing += 1;
        }
    }
    Ok((pairs, missing))
}

/// Rasters already in `dir`, keyed by file name minus a trailing `.tif`
/// (any case). Other files are ignored.
pub fn existing_outputs(dir: &Path) -> Result<HashMap<String, PathBuf>> {
    Ok(fs::read_dir(dir)
        .map_err(|e| NdviError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let stem = tif_stem(&name)?.to_string();
            Some((stem, entry.path()))
        })
        .collect())
}

fn tif_stem(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(".tif".len())?;
    let stem = name.get(..split)?;
    let ext = name.get(split..)?;
    (ext.eq_ignore_ascii_case(".tif") && !stem.is_empty()).then_some(stem)
}

/// Read, compute and write one pair. Returns the written raster's path.
pub fn produce_ndvi(
    pair: &BandPairPaths,
    output_dir: &Path,
    reflectance_scale: f64,
    options: &WriteOptions,
) -> Result<PathBuf> {
    let bands = read_band_pair(&pair.red, &pair.nir, reflectance_scale)?;
    let ndvi = compute_ndvi(&bands.red, &bands.nir)?;
    export_raster(&ndvi, &bands.geo, &output_dir.join(&pair.base_name), options)
}

pub fn process_single_directory(
    input_root: &Path,
    output_root: &Path,
    dir_name: &str,
    config: &IndexerConfig,
) -> Result<DirectoryReport> {
    let output_dir = output_root.join(dir_name);
    fs::create_dir_all(&output_dir).map_err(|e| NdviError::io(&output_dir, e))?;

    let options = config.write_options()?;
    let target_crs = config.target_crs();
    let index_path = output_dir.join(&config.index_file);
    let index_exists = index_path.exists();

    let existing = existing_outputs(&output_dir)?;
    let (pairs, missing_nir) =
        pair_bands(&input_root.join(dir_name), &config.red_suffix, &config.nir_suffix)?;

    let mut report = DirectoryReport::new(dir_name);
    report.missing_nir = missing_nir;
    let mut index = RasterIndex::new();

    for pair in &pairs {
        if let Some(existing_path) = existing.get(&pair.base_name) {
            info!(file = %pair.base_name, "already exists, skipping");
            report.skipped_existing += 1;
            if !index_exists {
                // left behind by a run that stopped before committing its index
                reindex_existing(existing_path, &pair.base_name, &target_crs, &mut index);
            }
            continue;
        }

        let raster_path = match produce_ndvi(pair, &output_dir, config.reflectance_scale, &options) {
            Ok(path) => path,
            Err(e) => {
                error!(file = %pair.base_name, error = %e, "skipping pair");
                report.failed += 1;
                continue;
            }
        };
        info!(file = %pair.base_name, dir = %output_dir.display(), "NDVI raster created");
        report.produced += 1;

        match bounding_box_of_path(&raster_path, &target_crs) {
            Ok(mbr) => index.push(pair.base_name.as_str(), &mbr),
            Err(e) => warn!(file = %pair.base_name, error = %e, "could not compute bounding box, not indexed"),
        }
    }

    report.indexed = index.len();
    report.index_written = index.write_once(&index_path)?;
    if report.index_written {
        debug!(entries = index.len(), path = %index_path.display(), "index written");
    } else {
        debug!(path = %index_path.display(), "index already present, left untouched");
    }
    Ok(report)
}

fn reindex_existing(path: &Path, base_name: &str, target_crs: &Crs, index: &mut RasterIndex) {
    match bounding_box_of_path(path, target_crs) {
        Ok(mbr) => index.push(base_name, &mbr),
        Err(e) => warn!(file = %base_name, error = %e, "existing output could not be indexed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pairs_by_base_name_and_counts_orphans() {
        let dir = TempDir::new().unwrap();
        for name in ["A_B4.TIF", "A_B5.TIF", "B_B4.TIF", "C_B5.TIF", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let (pairs, missing) = pair_bands(dir.path(), "_B4.TIF", "_B5.TIF").unwrap();
        assert_eq!(missing, 1);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].base_name, "A");
        assert_eq!(pairs[0].nir, dir.path().join("A_B5.TIF"));
    }

    #[test]
    fn existing_outputs_strip_only_the_tif_extension() {
        let dir = TempDir::new().unwrap();
        for name in ["scene.tif", "scene.v2.tif", "UPPER.TIF", "scene.tif.aux.xml", "raster_index.csv", ".tif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let existing = existing_outputs(dir.path()).unwrap();
        let mut stems: Vec<&str> = existing.keys().map(String::as_str).collect();
        stems.sort();
        assert_eq!(stems, vec!["UPPER", "scene", "scene.v2"]);
        assert_eq!(existing["scene.v2"], dir.path().join("scene.v2.tif"));
        assert_eq!(existing["UPPER"], dir.path().join("UPPER.TIF"));
    }
}
