// src/io/mod.rs
pub mod index;
pub mod reader;
pub mod writer;

pub use index::{RasterIndex, RasterIndexEntry, INDEX_FILE_NAME};
pub use reader::{open_dataset, read_band_pair, BandPair, GeoInfo};
pub use writer::{export_raster, Compression, WriteOptions};
