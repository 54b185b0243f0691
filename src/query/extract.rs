// src/query/extract.rs
//! Reading NDVI pixels back out of stored rasters.
use std::path::Path;

use gdal::raster::rasterize;
use gdal::vector::Geometry;
use gdal::{Dataset, DriverManager};

use crate::error::Result;
use crate::geometry::reproject::traditional_order;
use crate::geometry::wkt::envelope_of;
use crate::geometry::{BoundingBox, Crs, Reprojector};
use crate::io::open_dataset;
use crate::utils::NODATA;

/// Pixel rectangle within a raster, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col: usize,
    pub row: usize,
    pub cols: usize,
    pub rows: usize,
}

/// Cell containing `(x, y)` under a north-up geotransform, or `None` when the
/// coordinate falls outside the grid.
pub fn cell_index(gt: &[f64; 6], width: usize, height: usize, x: f64, y: f64) -> Option<(usize, usize)> {
    if gt[1] == 0.0 || gt[5] == 0.0 {
        return None;
    }
    let col = ((x - gt[0]) / gt[1]).floor();
    let row = ((y - gt[3]) / gt[5]).floor();
    if !(col >= 0.0 && row >= 0.0 && col < width as f64 && row < height as f64) {
        return None;
    }
    Some((col as usize, row as usize))
}

/// Smallest window of the grid covering `env`, clamped to the raster.
pub fn pixel_window(gt: &[f64; 6], width: usize, height: usize, env: &BoundingBox) -> Option<PixelWindow> {
    if gt[1] == 0.0 || gt[5] == 0.0 || width == 0 || height == 0 {
        return None;
    }
    let ca = ((env.min_lon - gt[0]) / gt[1]).floor();
    let cb = ((env.max_lon - gt[0]) / gt[1]).floor();
    let ra = ((env.max_lat - gt[3]) / gt[5]).floor();
    let rb = ((env.min_lat - gt[3]) / gt[5]).floor();

    let col0 = ca.min(cb).max(0.0);
    let col1 = ca.max(cb).min(width as f64 - 1.0);
    let row0 = ra.min(rb).max(0.0);
    let row1 = ra.max(rb).min(height as f64 - 1.0);
    if !(col0 <= col1 && row0 <= row1) {
        return None;
    }
    Some(PixelWindow {
        col: col0 as usize,
        row: row0 as usize,
        cols: (col1 - col0) as usize + 1,
        rows: (row1 - row0) as usize + 1,
    })
}

/// Transformer from `from` into the raster's own CRS; `None` when the raster
/// carries no projection and coordinates are taken as-is.
fn into_raster_crs(dataset: &Dataset, from: &Crs) -> Result<Option<Reprojector>> {
    if dataset.projection().is_empty() {
        return Ok(None);
    }
    let raster_srs = traditional_order(dataset.spatial_ref()?);
    Ok(Some(Reprojector::new(&from.spatial_ref()?, &raster_srs)?))
}

/// Stored byte at a latitude/longitude, nearest-cell. `Ok(None)` when the
/// point lies outside this raster.
pub fn pixel_at(path: &Path, lat: f64, lon: f64, point_crs: &Crs) -> Result<Option<u8>> {
    let dataset = open_dataset(path)?;
    let (x, y) = match into_raster_crs(&dataset, point_crs)? {
        Some(reprojector) => reprojector.point(lon, lat)?,
        None => (lon, lat),
    };

    let gt = dataset.geo_transform()?;
    let (width, height) = dataset.raster_size();
    let Some((col, row)) = cell_index(&gt, width, height, x, y) else {
        return Ok(None);
    };

    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<u8>((col as isize, row as isize), (1, 1), (1, 1), None)?;
    Ok(buffer.data().first().copied())
}

/// Values of every cell whose centre lies inside `geometry`, excluding the
/// no-data sentinel.
pub fn clip_values(path: &Path, geometry: &Geometry, geometry_crs: &Crs) -> Result<Vec<u8>> {
    let dataset = open_dataset(path)?;
    let local = match into_raster_crs(&dataset, geometry_crs)? {
        Some(reprojector) => geometry.transform(reprojector.transform())?,
        None => geometry.clone(),
    };

    let gt = dataset.geo_transform()?;
    let (width, height) = dataset.raster_size();
    let Some(window) = pixel_window(&gt, width, height, &envelope_of(&local)) else {
        return Ok(Vec::new());
    };

    let mask = burn_mask(&local, &gt, &window)?;
    let band = dataset.rasterband(1)?;
    let size = (window.cols, window.rows);
    let values = band.read_as::<u8>((window.col as isize, window.row as isize), size, size, None)?;

    Ok(values
        .data()
        .iter()
        .zip(&mask)
        .filter(|&(&v, &m)| m != 0 && v != NODATA)
        .map(|(&v, _)| v)
        .collect())
}

fn burn_mask(geometry: &Geometry, gt: &[f64; 6], window: &PixelWindow) -> Result<Vec<u8>> {
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut mask = driver.create_with_band_type::<u8, _>("", window.cols, window.rows, 1)?;

    let origin_x = gt[0] + window.col as f64 * gt[1] + window.row as f64 * gt[2];
    let origin_y = gt[3] + window.col as f64 * gt[4] + window.row as f64 * gt[5];
    mask.set_geo_transform(&[origin_x, gt[1], gt[2], origin_y, gt[4], gt[5]])?;

    rasterize(&mut mask, &[1], std::slice::from_ref(geometry), &[1.0], None)?;

    let band = mask.rasterband(1)?;
    let size = (window.cols, window.rows);
    Ok(band.read_as::<u8>((0, 0), size, size, None)?.data().to_vec())
}
