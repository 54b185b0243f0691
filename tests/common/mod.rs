// tests/common/mod.rs
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;

use ndvi_index::geometry::BoundingBox;
use ndvi_index::io::RasterIndex;
use ndvi_index::IndexerConfig;

/// 4x4 one-degree cells covering lon 10..14, lat 50..54.
pub const GT: [f64; 6] = [10.0, 1.0, 0.0, 54.0, 0.0, -1.0];
pub const SIZE: usize = 4;

pub fn wgs84_wkt() -> String {
    epsg_wkt(4326)
}

pub fn epsg_wkt(code: u32) -> String {
    SpatialRef::from_epsg(code).unwrap().to_wkt().unwrap()
}

pub fn write_raster<T: GdalType + Copy>(path: &Path, data: Vec<T>, gt: [f64; 6], projection: &str) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver
        .create_with_band_type::<T, _>(path, SIZE, SIZE, 1)
        .unwrap();
    ds.set_geo_transform(&gt).unwrap();
    ds.set_projection(projection).unwrap();
    let mut band = ds.rasterband(1).unwrap();
    let mut buffer = Buffer::new((SIZE, SIZE), data);
    band.write((0, 0), (SIZE, SIZE), &mut buffer).unwrap();
}

/// Red/NIR digital numbers, constant over the grid.
pub fn write_band_pair(dir: &Path, base: &str, red: u16, nir: u16, nir_gt: [f64; 6]) {
    fs::create_dir_all(dir).unwrap();
    let proj = wgs84_wkt();
    write_raster(&dir.join(format!("{base}_B4.TIF")), vec![red; SIZE * SIZE], GT, &proj);
    write_raster(&dir.join(format!("{base}_B5.TIF")), vec![nir; SIZE * SIZE], nir_gt, &proj);
}

/// Co-registered pair on an arbitrary grid and projection.
pub fn write_projected_pair(dir: &Path, base: &str, red: u16, nir: u16, gt: [f64; 6], projection: &str) {
    fs::create_dir_all(dir).unwrap();
    write_raster(&dir.join(format!("{base}_B4.TIF")), vec![red; SIZE * SIZE], gt, projection);
    write_raster(&dir.join(format!("{base}_B5.TIF")), vec![nir; SIZE * SIZE], gt, projection);
}

/// Stored NDVI bytes for one raster in a date directory, without indexing it.
pub fn write_ndvi(dir: &Path, base: &str, values: Vec<u8>, gt: [f64; 6]) -> BoundingBox {
    fs::create_dir_all(dir).unwrap();
    write_raster(&dir.join(format!("{base}.tif")), values, gt, &wgs84_wkt());
    let (x0, y0) = (gt[0], gt[3]);
    let (x1, y1) = (gt[0] + SIZE as f64 * gt[1], gt[3] + SIZE as f64 * gt[5]);
    BoundingBox::from_corners((x0, y0), (x1, y1))
}

pub fn write_index(dir: &Path, entries: &[(&str, BoundingBox)]) {
    let mut index = RasterIndex::new();
    for (name, bbox) in entries {
        index.push(*name, bbox);
    }
    assert!(index.write_once(&dir.join("raster_index.csv")).unwrap());
}

pub fn lossless_config() -> IndexerConfig {
    IndexerConfig {
        compress: "NONE".to_string(),
        workers: Some(2),
        ..IndexerConfig::default()
    }
}

pub fn read_u8(path: &Path) -> Vec<u8> {
    let ds = gdal::Dataset::open(path).unwrap();
    let band = ds.rasterband(1).unwrap();
    band.read_as::<u8>((0, 0), (SIZE, SIZE), (SIZE, SIZE), None)
        .unwrap()
        .data()
        .to_vec()
}
