// src/lib.rs
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod processing;
pub mod query;
pub mod utils;

pub use config::IndexerConfig;
pub use error::{ErrorKind, NdviError, Result};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
