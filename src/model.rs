//! Unified in-memory representation of a parsed trace file.
//!
//! Both parsers (FIT and GPX) produce a [`ParsedActivity`]; everything
//! downstream — best-section analysis, persistence, awards — works on this
//! representation and never sees format-specific data again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sections::SectionKind;

/// Per-record time series extracted from a trace file.
///
/// All vectors except `timestamps` are parallel: index `i` describes the
/// same record in each of them. `timestamps` (unix seconds) has the same
/// length, or is empty when the source carries no time data (possible for
/// GPX). Missing per-record values are `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceSeries {
    pub timestamps: Vec<i64>,
    /// Latitude in degrees.
    pub latitude: Vec<Option<f64>>,
    /// Longitude in degrees.
    pub longitude: Vec<Option<f64>>,
    /// Cumulative distance in meters.
    pub distance: Vec<Option<f64>>,
    /// Altitude in meters.
    pub altitude: Vec<Option<f64>>,
    /// Heart rate in bpm.
    pub heart_rate: Vec<Option<f64>>,
    /// Cadence in rpm.
    pub cadence: Vec<Option<f64>>,
    /// Speed in m/s.
    pub speed: Vec<Option<f64>>,
    /// Temperature in °C.
    pub temperature: Vec<Option<f64>>,
}

impl TraceSeries {
    /// Number of records in the series.
    pub fn len(&self) -> usize {
        self.latitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitude.is_empty()
    }
}

/// Min/avg/max summary of one series, ignoring missing values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

impl SeriesStats {
    /// Compute stats over the present values of a series.
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0u32;
        for v in values.iter().flatten() {
            min = min.min(*v);
            max = max.max(*v);
            sum += *v;
            count += 1;
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            min: Some(min),
            avg: Some(sum / f64::from(count)),
            max: Some(max),
        }
    }
}

/// A device-recorded lap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lap {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Elapsed time in seconds.
    pub elapsed_secs: f64,
    /// What ended the lap ("manual", "distance", ...).
    pub trigger: String,
    pub start_lat: Option<f64>,
    pub start_long: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_long: Option<f64>,
    /// Lap distance in meters.
    pub distance: Option<f64>,
    /// Average lap speed in m/s.
    pub speed: Option<f64>,
}

/// A best section of an activity, e.g. the fastest 5 km.
///
/// `start_index`/`end_index` point into the activity's [`TraceSeries`] so
/// the section can be highlighted on the stored track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSection {
    pub kind: SectionKind,
    /// Window distance in meters.
    pub distance: u32,
    pub start_index: usize,
    pub end_index: usize,
    /// Velocity in m/s for fastest sections, climb in m/min for climb
    /// sections.
    pub max_value: f64,
}

/// Everything extracted from a single trace file.
#[derive(Debug, Clone)]
pub struct ParsedActivity {
    pub path_to_file: PathBuf,
    pub file_name: String,
    pub md5sum: String,
    /// Sport name as recorded by the device (lowercase, e.g. "running").
    pub sport: String,
    /// Start of the activity.
    pub date: DateTime<Utc>,
    /// Total duration in seconds.
    pub duration_secs: f64,
    /// Total distance in kilometers.
    pub distance_km: Option<f64>,
    pub calories: Option<u32>,
    /// Accumulated uphill meters.
    pub total_ascent: Option<u32>,
    /// Accumulated downhill meters.
    pub total_descent: Option<u32>,
    pub aerobic_training_effect: Option<f64>,
    pub anaerobic_training_effect: Option<f64>,
    pub altitude_stats: SeriesStats,
    pub heart_rate_stats: SeriesStats,
    pub cadence_stats: SeriesStats,
    pub speed_stats: SeriesStats,
    pub temperature_stats: SeriesStats,
    pub series: TraceSeries,
    pub laps: Vec<Lap>,
    /// Filled in by the importer after sliding-window analysis.
    pub best_sections: Vec<BestSection>,
}

impl ParsedActivity {
    /// Compute all summary statistics from the time series.
    pub fn compute_stats(&mut self) {
        self.altitude_stats = SeriesStats::from_values(&self.series.altitude);
        self.heart_rate_stats = SeriesStats::from_values(&self.series.heart_rate);
        self.cadence_stats = SeriesStats::from_values(&self.series.cadence);
        self.speed_stats = SeriesStats::from_values(&self.series.speed);
        self.temperature_stats = SeriesStats::from_values(&self.series.temperature);
    }
}
