//! Importer configuration.

use std::path::PathBuf;

use crate::sections::SectionKind;

/// File name suffixes the importer picks up (matched case-insensitively).
pub const SUPPORTED_FORMATS: &[&str] = &[".fit", ".gpx", ".fit.gz", ".gpx.gz"];

/// One best-section definition: a kind plus the window distances (in meters)
/// it is evaluated over.
#[derive(Debug, Clone)]
pub struct SectionDef {
    pub kind: SectionKind,
    pub distances: Vec<u32>,
}

/// Configuration for an import run.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Directory tree to scan for trace files.
    pub trace_dir: PathBuf,
    /// Best-section definitions evaluated for every imported activity.
    pub sections: Vec<SectionDef>,
    /// Emit a progress log line every this many imported files.
    pub progress_interval: usize,
    /// Number of entries per awards ranking.
    pub rank_limit: usize,
}

impl ImportConfig {
    /// Config for the given trace directory with default section
    /// definitions, progress interval and rank limit.
    pub fn new(trace_dir: impl Into<PathBuf>) -> Self {
        Self {
            trace_dir: trace_dir.into(),
            sections: default_sections(),
            progress_interval: 10,
            rank_limit: 3,
        }
    }
}

/// The default best-section catalog: fastest windows over common race
/// distances and climb windows over short ramps.
pub fn default_sections() -> Vec<SectionDef> {
    vec![
        SectionDef {
            kind: SectionKind::Fastest,
            distances: vec![1_000, 2_000, 3_000, 5_000, 10_000],
        },
        SectionDef {
            kind: SectionKind::Climb,
            distances: vec![100, 200, 500, 1_000],
        },
    ]
}

/// Whether a file name ends in one of the supported trace suffixes.
pub fn is_supported_format(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    SUPPORTED_FORMATS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats() {
        assert!(is_supported_format("morning_run.fit"));
        assert!(is_supported_format("Morning_Run.FIT"));
        assert!(is_supported_format("tour.gpx.gz"));
        assert!(is_supported_format("tour.fit.gz"));
        assert!(!is_supported_format("workout.tcx"));
        assert!(!is_supported_format("notes.txt"));
        assert!(!is_supported_format("archive.gz"));
    }

    #[test]
    fn test_default_config() {
        let config = ImportConfig::new("/tmp/traces");
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.rank_limit, 3);
        let fastest = &config.sections[0];
        assert_eq!(fastest.kind, SectionKind::Fastest);
        assert!(fastest.distances.contains(&5_000));
    }
}
