//! The import pipeline.
//!
//! Sequential per-file processing: discover trace files, checksum them,
//! skip known content, parse the rest, run best-section analysis, and
//! upsert the results into the store. Parse failures and duplicate
//! checksums are reported without aborting the run.

use std::collections::HashMap;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::Serialize;

use crate::checksum::calc_md5;
use crate::config::ImportConfig;
use crate::discovery::discover_trace_files;
use crate::error::Result;
use crate::parser::parse_trace_file;
use crate::sections::best_sections;
use crate::store::ActivityStore;

/// Whether known checksums are skipped or overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Import new files only; known checksums are skipped.
    Import,
    /// Re-parse everything and overwrite stored payloads in place.
    Reimport,
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Trace files discovered under the configured directory.
    pub found: usize,
    /// Newly inserted activities.
    pub imported: usize,
    /// Activities overwritten during a reimport.
    pub updated: usize,
    /// Files skipped because their checksum is already stored.
    pub skipped_known: usize,
    /// Files skipped because another file with the same checksum was
    /// imported earlier in this run.
    pub duplicates: usize,
    /// Files that failed to parse.
    pub failures: usize,
}

/// Run the import pipeline over `config.trace_dir`.
pub fn run_importer(
    store: &mut ActivityStore,
    config: &ImportConfig,
    mode: ImportMode,
) -> Result<ImportReport> {
    debug!("triggered file importer on path: {}", config.trace_dir.display());
    store.populate_default_sports()?;

    let trace_files = discover_trace_files(&config.trace_dir)?;
    info!(
        "found {} activity file(s) in {}",
        trace_files.len(),
        config.trace_dir.display()
    );

    let mut report = ImportReport {
        found: trace_files.len(),
        ..ImportReport::default()
    };

    // Hash everything up front; the checksums double as the all-known
    // short-circuit and the per-file dedup decision.
    let mut checksums: Vec<(PathBuf, String)> = Vec::with_capacity(trace_files.len());
    for path in trace_files {
        match calc_md5(&path) {
            Ok(md5sum) => checksums.push((path, md5sum)),
            Err(e) => {
                warn!("failed to checksum {}: {e}", path.display());
                report.failures += 1;
            }
        }
    }

    let known = store.known_md5sums()?;
    if mode == ImportMode::Import && checksums.iter().all(|(_, md5)| known.contains(md5)) {
        info!("finished file import: no new files imported");
        return Ok(report);
    }

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for (path, md5sum) in checksums {
        if let Some(first_path) = seen.get(&md5sum) {
            warn!(
                "these two files have the same checksum, you might want to remove one of them: \
                 {} and {}",
                first_path.display(),
                path.display()
            );
            report.duplicates += 1;
            continue;
        }
        seen.insert(md5sum.clone(), path.clone());

        let already_stored = known.contains(&md5sum);
        if mode == ImportMode::Import && already_stored {
            report.skipped_known += 1;
            continue;
        }

        let mut parsed = match parse_trace_file(&path, &md5sum) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    "failed to parse {}; file could be corrupted or does not comply \
                     with its format: {e}",
                    path.display()
                );
                report.failures += 1;
                continue;
            }
        };
        parsed.best_sections = best_sections(&parsed.series, &config.sections);

        if already_stored {
            store.update_activity(&parsed)?;
            report.updated += 1;
        } else {
            store.insert_activity(&parsed)?;
            report.imported += 1;
        }

        let written = report.imported + report.updated;
        if written % config.progress_interval.max(1) == 0 {
            info!("progress update: imported {written} files");
        }
    }

    if report.imported + report.updated == 0 {
        info!("finished file import: no new files imported");
    } else {
        info!(
            "finished file import: imported {} new and updated {} file(s)",
            report.imported, report.updated
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_trace_dir_is_hard_error() {
        let mut store = ActivityStore::in_memory().unwrap();
        let config = ImportConfig::new("/no/such/traces");
        let result = run_importer(&mut store, &config, ImportMode::Import);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_trace_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ActivityStore::in_memory().unwrap();
        let config = ImportConfig::new(dir.path());
        let report = run_importer(&mut store, &config, ImportMode::Import).unwrap();
        assert_eq!(report, ImportReport::default());
    }

    #[test]
    fn test_corrupted_file_is_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.fit"), b"not a fit file").unwrap();

        let mut store = ActivityStore::in_memory().unwrap();
        let config = ImportConfig::new(dir.path());
        let report = run_importer(&mut store, &config, ImportMode::Import).unwrap();
        assert_eq!(report.found, 1);
        assert_eq!(report.failures, 1);
        assert_eq!(report.imported, 0);
        assert_eq!(store.activity_count().unwrap(), 0);
    }
}
