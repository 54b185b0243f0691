// src/utils/mod.rs
pub mod scaling;
pub mod stats;

pub use scaling::{denormalize, normalize, NODATA};
pub use stats::{summarize, Summary};
