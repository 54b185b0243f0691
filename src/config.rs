// src/config.rs
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NdviError, Result};
use crate::geometry::Crs;
use crate::io::{Compression, WriteOptions, INDEX_FILE_NAME};

/// Settings for a batch indexing run, loadable from JSON. Every field has a
/// default, so `{}` is a valid configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct IndexerConfig {
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_red_suffix")]
    pub red_suffix: String,
    #[serde(default = "default_nir_suffix")]
    pub nir_suffix: String,
    /// Digital numbers are divided by this to obtain reflectance.
    #[serde(default = "default_reflectance_scale")]
    pub reflectance_scale: f64,
    #[serde(default = "default_target_crs")]
    pub target_crs: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    /// Worker threads; the processor count when unset.
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_compress() -> String {
    "JPEG".to_string()
}

fn default_quality() -> u8 {
    60
}

fn default_red_suffix() -> String {
    "_B4.TIF".to_string()
}

fn default_nir_suffix() -> String {
    "_B5.TIF".to_string()
}

fn default_reflectance_scale() -> f64 {
    10000.0
}

fn default_target_crs() -> String {
    Crs::WGS84.to_string()
}

fn default_index_file() -> String {
    INDEX_FILE_NAME.to_string()
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            quality: default_quality(),
            red_suffix: default_red_suffix(),
            nir_suffix: default_nir_suffix(),
            reflectance_scale: default_reflectance_scale(),
            target_crs: default_target_crs(),
            index_file: default_index_file(),
            workers: None,
        }
    }
}

impl IndexerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| NdviError::io(path, e))?;
        let config: IndexerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(NdviError::Format(format!(
                "quality must be within 1..=100, got {}",
                self.quality
            )));
        }
        self.compress.parse::<Compression>()?;
        if !(self.reflectance_scale.is_finite() && self.reflectance_scale > 0.0) {
            return Err(NdviError::Format(format!(
                "reflectance_scale must be positive, got {}",
                self.reflectance_scale
            )));
        }
        if self.red_suffix.is_empty() || self.nir_suffix.is_empty() {
            return Err(NdviError::Format("band suffixes must not be empty".to_string()));
        }
        if self.red_suffix == self.nir_suffix {
            return Err(NdviError::Format(format!(
                "red and NIR suffixes are both '{}'",
                self.red_suffix
            )));
        }
        if self.index_file.is_empty() {
            return Err(NdviError::Format("index_file must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn write_options(&self) -> Result<WriteOptions> {
        Ok(WriteOptions {
            compress: self.compress.parse()?,
            quality: self.quality,
        })
    }

    pub fn target_crs(&self) -> Crs {
        Crs::new(self.target_crs.clone())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }
}
