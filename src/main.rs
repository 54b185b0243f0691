// src/main.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ndvi_index::cli::{Cli, Commands};
use ndvi_index::geometry::wkt_to_bounds;
use ndvi_index::processing::BatchIndexer;
use ndvi_index::query::output::{
    point_file_name, region_file_name, write_point_series, write_region_series,
};
use ndvi_index::query::{timeseries_point, timeseries_range, DateRange, PointScan, QueryOptions};
use ndvi_index::IndexerConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.quiet)?;

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            quality,
            compress,
            workers,
        } => {
            let mut config = match config {
                Some(path) => IndexerConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => IndexerConfig::default(),
            };
            if let Some(quality) = quality {
                config.quality = quality;
            }
            if let Some(compress) = compress {
                config.compress = compress;
            }
            if workers.is_some() {
                config.workers = workers;
            }
            config.validate()?;

            let indexer = BatchIndexer::new(config);
            let report = indexer.run(&input, &output)?;
            println!(
                "Processing complete: {} rasters written, {} skipped, {} failed, {} directories aborted",
                report.produced(),
                report.skipped_existing(),
                report.failed(),
                report.aborted_directories()
            );
        }
        Commands::Timeseries {
            input,
            start,
            end,
            point,
            wkt,
            output_dir,
            first_match,
        } => {
            let range = DateRange::new(start, end);
            let options = QueryOptions {
                point_scan: if first_match {
                    PointScan::FirstMatch
                } else {
                    PointScan::PerDate
                },
                ..QueryOptions::default()
            };

            if let Some(point) = point {
                let (lat, lon) = (point[0], point[1]);
                handle_point(lat, lon, &range, &input, &output_dir, &options);
            }

            if let Some(wkt_path) = wkt {
                if wkt_path.is_file() {
                    match fs::read_to_string(&wkt_path) {
                        Ok(wkt) => handle_region(&wkt, &range, &input, &output_dir, &options),
                        Err(e) => error!(file = %wkt_path.display(), error = %e, "cannot read WKT file"),
                    }
                } else {
                    warn!("The WKT file {} does not exist.", wkt_path.display());
                }
            }
        }
    }

    Ok(())
}

fn setup_logging(quiet: bool) -> Result<()> {
    let level = if quiet { Level::ERROR } else { Level::DEBUG };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    Ok(())
}

fn handle_point(
    lat: f64,
    lon: f64,
    range: &DateRange,
    input: &Path,
    output_dir: &Path,
    options: &QueryOptions,
) {
    let path: PathBuf = output_dir.join(point_file_name(range, lat, lon));
    let result = timeseries_point(lat, lon, range, input, options)
        .and_then(|records| write_point_series(&path, &records).map(|_| records));
    match result {
        Ok(records) => {
            info!("Point time series saved to {}", path.display());
            debug!(?records, "time series data");
        }
        Err(e) => error!("Error processing point time series: {e}"),
    }
}

fn handle_region(
    wkt: &str,
    range: &DateRange,
    input: &Path,
    output_dir: &Path,
    options: &QueryOptions,
) {
    let result = wkt_to_bounds(wkt, &options.query_crs, &options.query_crs).and_then(|mbr| {
        let path = output_dir.join(region_file_name(range, &mbr));
        let records = timeseries_range(wkt, range, input, options)?;
        write_region_series(&path, &records)?;
        Ok((path, records))
    });
    match result {
        Ok((path, records)) => {
            info!("Range time series saved to {}", path.display());
            debug!(?records, "time series data");
        }
        Err(e) => error!("Error processing range time series: {e}"),
    }
}
