//! Trace file discovery.
//!
//! Walks a directory tree and collects every file with a supported trace
//! suffix. Unreadable subtrees are logged and skipped; only a missing or
//! non-directory root is a hard error.

use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::config::is_supported_format;
use crate::error::{Error, Result};

/// Directory and file names never worth descending into.
const IGNORED_NAMES: &[&str] = &[".git", ".svn", ".DS_Store", "Thumbs.db"];

/// Recursively collect all trace files under `root`, sorted by path so
/// import order is deterministic.
pub fn discover_trace_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::TraceDirNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut trace_files: Vec<PathBuf> = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !IGNORED_NAMES.contains(&name.as_ref())
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy();
                if is_supported_format(&name) {
                    trace_files.push(entry.path().to_path_buf());
                }
            }
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
            }
        }
    }

    trace_files.sort();
    Ok(trace_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2023").join("june");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("run.fit"), b"x").unwrap();
        fs::write(dir.path().join("tour.GPX"), b"x").unwrap();
        fs::write(nested.join("ride.fit.gz"), b"x").unwrap();
        fs::write(nested.join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("export.tcx"), b"x").unwrap();

        let files = discover_trace_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|p| {
            let name = p.file_name().unwrap().to_string_lossy().to_lowercase();
            name.ends_with(".fit") || name.ends_with(".gpx") || name.ends_with(".fit.gz")
        }));
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover_trace_files(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_missing_root() {
        let result = discover_trace_files(Path::new("/no/such/traces"));
        assert!(matches!(result, Err(Error::TraceDirNotFound(_))));
    }

    #[test]
    fn test_discover_root_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("run.fit");
        fs::write(&file, b"x").unwrap();
        let result = discover_trace_files(&file);
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_discover_skips_ignored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let git = dir.path().join(".git");
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("blob.fit"), b"x").unwrap();
        fs::write(dir.path().join("real.fit"), b"x").unwrap();

        let files = discover_trace_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("real.fit"));
    }
}
