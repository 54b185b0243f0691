// src/io/reader.rs
use std::path::Path;

use gdal::Dataset;
use rayon::prelude::*;

use crate::error::{NdviError, Result};

/// Paired bands must share their geotransform to within this absolute tolerance.
pub const GEOTRANSFORM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

impl GeoInfo {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let (width, height) = dataset.raster_size();
        Ok(Self {
            projection: dataset.projection(),
            geo_transform: dataset.geo_transform()?,
            width,
            height,
        })
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Red and near-infrared reflectance on the same grid, row-major.
#[derive(Debug, Clone)]
pub struct BandPair {
    pub red: Vec<f64>,
    pub nir: Vec<f64>,
    pub geo: GeoInfo,
}

pub fn open_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(NdviError::NotFound(path.to_path_buf()));
    }
    Dataset::open(path).map_err(|e| NdviError::io(path, e))
}

pub fn transforms_match(a: &[f64; 6], b: &[f64; 6], tolerance: f64) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tolerance)
}

/// Opens both bands, checks they are co-registered and scales digital
/// numbers to reflectance by `1 / reflectance_scale`.
pub fn read_band_pair(red_path: &Path, nir_path: &Path, reflectance_scale: f64) -> Result<BandPair> {
    let red_ds = open_dataset(red_path)?;
    let nir_ds = open_dataset(nir_path)?;

    let red_geo = GeoInfo::from_dataset(&red_ds)?;
    let nir_geo = GeoInfo::from_dataset(&nir_ds)?;

    if !transforms_match(&red_geo.geo_transform, &nir_geo.geo_transform, GEOTRANSFORM_TOLERANCE)
        || red_geo.projection != nir_geo.projection
    {
        return Err(NdviError::Validation(format!(
            "geotransform or projection of {} and {} do not match",
            red_path.display(),
            nir_path.display()
        )));
    }
    if (red_geo.width, red_geo.height) != (nir_geo.width, nir_geo.height) {
        return Err(NdviError::Validation(format!(
            "band sizes differ: {}x{} vs {}x{}",
            red_geo.width, red_geo.height, nir_geo.width, nir_geo.height
        )));
    }

    let red = read_reflectance(&red_ds, &red_geo, reflectance_scale)?;
    let nir = read_reflectance(&nir_ds, &nir_geo, reflectance_scale)?;

    Ok(BandPair {
        red,
        nir,
        geo: red_geo,
    })
}

fn read_reflectance(dataset: &Dataset, geo: &GeoInfo, reflectance_scale: f64) -> Result<Vec<f64>> {
    let band = dataset.rasterband(1)?;
    let size = (geo.width, geo.height);
    let buffer = band.read_as::<f64>((0, 0), size, size, None)?;
    Ok(buffer.data().par_iter().map(|v| v / reflectance_scale).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_absolute() {
        let a = [500000.0, 30.0, 0.0, 4_600_000.0, 0.0, -30.0];
        let mut b = a;
        b[0] += 5e-7;
        assert!(transforms_match(&a, &b, GEOTRANSFORM_TOLERANCE));
        b[3] += 2e-6;
        assert!(!transforms_match(&a, &b, GEOTRANSFORM_TOLERANCE));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_band_pair(Path::new("/nope/a_B4.TIF"), Path::new("/nope/a_B5.TIF"), 10000.0)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }
}
