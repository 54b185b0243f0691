// src/cli.rs
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ndvi-index")]
#[command(about = "NDVI raster production, spatial indexing and time-series queries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every date subdirectory of red/NIR band pairs into indexed NDVI rasters
    Process {
        /// Input directory holding one subdirectory per date
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for NDVI rasters and indexes
        #[arg(short, long)]
        output: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Compression quality (1-100)
        #[arg(long)]
        quality: Option<u8>,

        /// Compression: JPEG, DEFLATE, LZW, ZSTD or NONE
        #[arg(long)]
        compress: Option<String>,

        /// Worker threads [default: processor count]
        #[arg(long)]
        workers: Option<usize>,
    },

    /// NDVI time series at a point or over a WKT region
    Timeseries {
        /// Directory of NDVI rasters, one subdirectory per date
        #[arg(short, long)]
        input: PathBuf,

        /// Start date (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        end: NaiveDate,

        /// Latitude and longitude for a point time series
        #[arg(short, long, num_args = 2, value_names = ["LATITUDE", "LONGITUDE"], allow_negative_numbers = true)]
        point: Option<Vec<f64>>,

        /// Path to a WKT file for a region time series
        #[arg(short, long)]
        wkt: Option<PathBuf>,

        /// Directory the result CSVs are written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Stop the point series at the first matching date
        #[arg(long)]
        first_match: bool,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
