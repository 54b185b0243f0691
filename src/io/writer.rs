// src/io/writer.rs
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{DriverManager, Metadata};
use rayon::prelude::*;

use super::reader::GeoInfo;
use crate::error::{NdviError, Result};
use crate::utils::scaling::{to_pixel, NODATA};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Jpeg,
    Deflate,
    Lzw,
    Zstd,
    None,
}

impl FromStr for Compression {
    type Err = NdviError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "JPEG" => Ok(Compression::Jpeg),
            "DEFLATE" => Ok(Compression::Deflate),
            "LZW" => Ok(Compression::Lzw),
            "ZSTD" => Ok(Compression::Zstd),
            "NONE" => Ok(Compression::None),
            other => Err(NdviError::Format(format!("unsupported compression: {other}"))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::Jpeg => "JPEG",
            Compression::Deflate => "DEFLATE",
            Compression::Lzw => "LZW",
            Compression::Zstd => "ZSTD",
            Compression::None => "NONE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub compress: Compression,
    /// 1..=100, only used by JPEG.
    pub quality: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: Compression::Jpeg,
            quality: 60,
        }
    }
}

impl WriteOptions {
    pub fn creation_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        match self.compress {
            Compression::None => {}
            Compression::Jpeg => {
                options.push("COMPRESS=JPEG".to_string());
                options.push(format!("JPEG_QUALITY={}", self.quality.clamp(1, 100)));
            }
            other => options.push(format!("COMPRESS={other}")),
        }
        options
    }
}

/// `name` with `.tif` appended unless it already carries it.
pub fn with_tif_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("tif") => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".tif");
            PathBuf::from(name)
        }
    }
}

/// Writes NDVI as a single-band byte GeoTIFF. Cells that are NaN or do not
/// normalize above zero are stored as the no-data sentinel. A partially
/// written file is removed so it is never mistaken for finished output.
pub fn export_raster(
    ndvi: &[f64],
    geo: &GeoInfo,
    path: &Path,
    options: &WriteOptions,
) -> Result<PathBuf> {
    if ndvi.len() != geo.len() {
        return Err(NdviError::Validation(format!(
            "NDVI grid has {} cells, expected {}x{}",
            ndvi.len(),
            geo.width,
            geo.height
        )));
    }
    let path = with_tif_extension(path);
    let pixels: Vec<u8> = ndvi.par_iter().map(|&v| to_pixel(v)).collect();

    if let Err(e) = write_byte_raster(pixels, geo, &path, options) {
        let _ = fs::remove_file(&path);
        return Err(NdviError::io(&path, e));
    }
    Ok(path)
}

fn write_byte_raster(
    pixels: Vec<u8>,
    geo: &GeoInfo,
    path: &Path,
    options: &WriteOptions,
) -> gdal::errors::Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let creation_options = RasterCreationOptions::from_iter(options.creation_options());

    let mut out_ds = driver.create_with_band_type_with_options::<u8, _>(
        path,
        geo.width,
        geo.height,
        1,
        &creation_options,
    )?;

    out_ds.set_geo_transform(&geo.geo_transform)?;
    if !geo.projection.is_empty() {
        out_ds.set_projection(&geo.projection)?;
    }

    let mut band = out_ds.rasterband(1)?;
    band.set_no_data_value(Some(NODATA as f64))?;
    band.set_description("NDVI (1..255, 0 = no data)")?;

    let shape = (geo.width, geo.height);
    let mut buffer = Buffer::new(shape, pixels);
    band.write((0, 0), shape, &mut buffer)?;

    out_ds.flush_cache()?;
    Ok(())
}
