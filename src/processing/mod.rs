// src/processing/mod.rs
pub mod directory;
pub mod ndvi;
pub mod parallel;

// Re-export main components
pub use directory::{pair_bands, process_single_directory, produce_ndvi, BandPairPaths, DirectoryReport};
pub use ndvi::compute_ndvi;
pub use parallel::{BatchIndexer, BatchReport, DirectoryQueue};
