//! Trace file parsing: format detection, gzip unwrap, and dispatch.
//!
//! The importer hands every discovered file to [`parse_trace_file`], which
//! decompresses gzip in memory when needed and routes the bytes to the
//! format-specific parser. Both parsers return the same [`ParsedActivity`]
//! representation.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use log::debug;

use crate::error::{Error, Result};
use crate::model::ParsedActivity;

pub mod fit;
pub mod gpx;

/// Supported trace file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    Fit,
    Gpx,
}

/// Detect the format of a file from its name. Returns the format and
/// whether the file is gzip-compressed.
pub fn detect_format(path: &Path) -> Option<(TraceFormat, bool)> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();
    if name.ends_with(".fit") {
        Some((TraceFormat::Fit, false))
    } else if name.ends_with(".gpx") {
        Some((TraceFormat::Gpx, false))
    } else if name.ends_with(".fit.gz") {
        Some((TraceFormat::Fit, true))
    } else if name.ends_with(".gpx.gz") {
        Some((TraceFormat::Gpx, true))
    } else {
        None
    }
}

/// Parse a single trace file into the unified representation.
///
/// `md5sum` is the checksum of the file as it sits on disk; it travels with
/// the parsed payload so the store can key on it.
pub fn parse_trace_file(path: &Path, md5sum: &str) -> Result<ParsedActivity> {
    let (format, gzipped) =
        detect_format(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;

    debug!("importing {} ...", path.display());

    let mut data = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if gzipped {
        let mut decompressed = Vec::new();
        GzDecoder::new(data.as_slice())
            .read_to_end(&mut decompressed)
            .map_err(|e| Error::Decompress {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(
            "decompressed {} ({} -> {} bytes)",
            path.display(),
            data.len(),
            decompressed.len()
        );
        data = decompressed;
    }

    let parsed = match format {
        TraceFormat::Fit => fit::parse(&data, path, md5sum)?,
        TraceFormat::Gpx => gpx::parse(&data, path, md5sum)?,
    };
    debug!(
        "finished parsing {} ({} records, sport: {})",
        path.display(),
        parsed.series.len(),
        parsed.sport
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("a/b/run.fit")),
            Some((TraceFormat::Fit, false))
        );
        assert_eq!(
            detect_format(Path::new("Tour.GPX")),
            Some((TraceFormat::Gpx, false))
        );
        assert_eq!(
            detect_format(Path::new("ride.fit.gz")),
            Some((TraceFormat::Fit, true))
        );
        assert_eq!(
            detect_format(Path::new("hike.gpx.gz")),
            Some((TraceFormat::Gpx, true))
        );
        assert_eq!(detect_format(Path::new("workout.tcx")), None);
        assert_eq!(detect_format(Path::new("archive.gz")), None);
    }

    #[test]
    fn test_unsupported_format_error() {
        let result = parse_trace_file(Path::new("/tmp/export.tcx"), "0".repeat(32).as_str());
        assert!(matches!(result, Err(Error::UnsupportedFormat(p)) if p == PathBuf::from("/tmp/export.tcx")));
    }

    #[test]
    fn test_corrupted_fit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.fit");
        std::fs::write(&path, b"this is definitely not a fit file").unwrap();
        let result = parse_trace_file(&path, "00000000000000000000000000000000");
        assert!(matches!(result, Err(Error::Fit(_))));
    }

    #[test]
    fn test_corrupted_gzip_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gpx.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();
        let result = parse_trace_file(&path, "00000000000000000000000000000000");
        assert!(matches!(result, Err(Error::Decompress { .. })));
    }
}
