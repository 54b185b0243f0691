use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NdviError>;

/// Coarse classification used by callers deciding whether to skip a unit
/// of work or give up on the surrounding directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Validation,
    Io,
    NotFound,
}

#[derive(Error, Debug)]
pub enum NdviError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("File I/O error: {0}")]
    StdIo(#[from] std::io::Error),
}

impl NdviError {
    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        NdviError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NdviError::Format(_) | NdviError::Config(_) | NdviError::DateParse(_) => {
                ErrorKind::Format
            }
            NdviError::Validation(_) => ErrorKind::Validation,
            NdviError::NotFound(_) => ErrorKind::NotFound,
            NdviError::StdIo(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            NdviError::Io { .. } | NdviError::Gdal(_) | NdviError::Csv(_) | NdviError::StdIo(_) => {
                ErrorKind::Io
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(NdviError::Format("LINESTRING".into()).kind(), ErrorKind::Format);
        assert_eq!(NdviError::Validation("gt".into()).kind(), ErrorKind::Validation);
        assert_eq!(NdviError::NotFound("a.csv".into()).kind(), ErrorKind::NotFound);
        assert_eq!(NdviError::io("out.tif", "disk full").kind(), ErrorKind::Io);

        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(NdviError::from(missing).kind(), ErrorKind::NotFound);
    }
}
