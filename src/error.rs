//! Unified error handling for the tracevault library.
//!
//! All fallible operations return [`Result`]; per-file import failures are
//! caught by the importer and reported without aborting the run.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by tracevault.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured trace directory does not exist.
    #[error("trace directory not found: {0}")]
    TraceDirNotFound(PathBuf),

    /// The configured trace directory path is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A file could not be opened or read from disk.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file name does not match any supported trace format.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A gzip-compressed file could not be decompressed.
    #[error("failed to decompress {path}: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The FIT decoder rejected the file (bad header, truncated data, ...).
    #[error("FIT parse error: {0}")]
    Fit(#[from] fitparser::Error),

    /// The GPX reader rejected the file.
    #[error("GPX parse error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    /// The file parsed but contains no usable track points.
    #[error("trace has no track points: {0}")]
    EmptyTrace(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("series encode error: {0}")]
    SeriesEncode(#[from] rmp_serde::encode::Error),

    #[error("series decode error: {0}")]
    SeriesDecode(#[from] rmp_serde::decode::Error),

    #[error("catalog serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tracevault operations.
pub type Result<T> = std::result::Result<T, Error>;
