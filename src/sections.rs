//! Best-section analysis over activity time series.
//!
//! For every configured window distance the analyzer finds the contiguous
//! stretch of the track that maximizes a metric, using a two-pointer sliding
//! window over cumulative distance:
//!
//! - **fastest**: highest average velocity (m/s) over the window
//! - **climb**: highest accumulated elevation gain per minute (m/min)
//!
//! Analysis is best-effort: an activity without distance or time data, or
//! one shorter than a window distance, simply yields no section for it.

use serde::{Deserialize, Serialize};

use crate::config::SectionDef;
use crate::model::{BestSection, TraceSeries};

/// The metric a best section is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Fastest,
    Climb,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Fastest => "fastest",
            SectionKind::Climb => "climb",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fastest" => Some(SectionKind::Fastest),
            "climb" => Some(SectionKind::Climb),
            _ => None,
        }
    }
}

/// Compute all best sections of an activity for the given definitions.
pub fn best_sections(series: &TraceSeries, defs: &[SectionDef]) -> Vec<BestSection> {
    let n = series.len();
    if n < 2 || series.timestamps.len() != n {
        return Vec::new();
    }

    let distance = fill_forward(&series.distance);
    let timestamps = &series.timestamps;

    let mut sections = Vec::new();
    for def in defs {
        match def.kind {
            SectionKind::Fastest => {
                for &target in &def.distances {
                    if let Some(section) = best_fastest_section(&distance, timestamps, target) {
                        sections.push(section);
                    }
                }
            }
            SectionKind::Climb => {
                // Climb sections need altitude data.
                if series.altitude.iter().all(|a| a.is_none()) {
                    continue;
                }
                let gain = cumulative_gain(&fill_forward(&series.altitude));
                for &target in &def.distances {
                    if let Some(section) = best_climb_section(&distance, timestamps, &gain, target)
                    {
                        sections.push(section);
                    }
                }
            }
        }
    }
    sections
}

/// Replace missing values with the last present one. Leading gaps take the
/// first present value so deltas across them are zero.
fn fill_forward(values: &[Option<f64>]) -> Vec<f64> {
    let first = values.iter().flatten().copied().next().unwrap_or(0.0);
    let mut filled = Vec::with_capacity(values.len());
    let mut last = first;
    for v in values {
        if let Some(v) = v {
            last = *v;
        }
        filled.push(last);
    }
    filled
}

/// Cumulative sum of positive altitude deltas; `gain[j] - gain[i]` is the
/// uphill meters accumulated between records `i` and `j`.
fn cumulative_gain(altitude: &[f64]) -> Vec<f64> {
    let mut gain = Vec::with_capacity(altitude.len());
    let mut total = 0.0;
    gain.push(0.0);
    for w in altitude.windows(2) {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            total += delta;
        }
        gain.push(total);
    }
    gain
}

/// Find the window covering at least `target` meters with the highest
/// average velocity. Two-pointer: for each end index keep the tightest
/// start that still covers the target, so the scan stays O(n).
fn best_fastest_section(
    distance: &[f64],
    timestamps: &[i64],
    target: u32,
) -> Option<BestSection> {
    let target = f64::from(target);
    let n = distance.len();
    let mut best: Option<(usize, usize, f64)> = None;
    let mut start = 0;

    for end in 1..n {
        while start + 1 < end && distance[end] - distance[start + 1] >= target {
            start += 1;
        }
        let covered = distance[end] - distance[start];
        if covered < target {
            continue;
        }
        let elapsed = (timestamps[end] - timestamps[start]) as f64;
        if elapsed <= 0.0 {
            continue;
        }
        let velocity = covered / elapsed;
        if best.map_or(true, |(_, _, v)| velocity > v) {
            best = Some((start, end, velocity));
        }
    }

    best.map(|(start_index, end_index, max_value)| BestSection {
        kind: SectionKind::Fastest,
        distance: target as u32,
        start_index,
        end_index,
        max_value,
    })
}

/// Find the window covering at least `target` meters with the highest
/// climb rate (accumulated uphill meters per minute).
fn best_climb_section(
    distance: &[f64],
    timestamps: &[i64],
    gain: &[f64],
    target: u32,
) -> Option<BestSection> {
    let target = f64::from(target);
    let n = distance.len();
    let mut best: Option<(usize, usize, f64)> = None;
    let mut start = 0;

    for end in 1..n {
        while start + 1 < end && distance[end] - distance[start + 1] >= target {
            start += 1;
        }
        if distance[end] - distance[start] < target {
            continue;
        }
        let minutes = (timestamps[end] - timestamps[start]) as f64 / 60.0;
        if minutes <= 0.0 {
            continue;
        }
        let climb = (gain[end] - gain[start]) / minutes;
        if best.map_or(true, |(_, _, v)| climb > v) {
            best = Some((start, end, climb));
        }
    }

    best.map(|(start_index, end_index, max_value)| BestSection {
        kind: SectionKind::Climb,
        distance: target as u32,
        start_index,
        end_index,
        max_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_sections;

    /// Series with one record every `step_secs` seconds, `step_m` meters
    /// apart, at the given altitudes (cycled if shorter than `points`).
    fn make_series(points: usize, step_m: f64, step_secs: i64, altitudes: &[f64]) -> TraceSeries {
        let mut series = TraceSeries::default();
        for i in 0..points {
            series.timestamps.push(1_000_000 + i as i64 * step_secs);
            series.latitude.push(Some(47.0));
            series.longitude.push(Some(8.0));
            series.distance.push(Some(i as f64 * step_m));
            series
                .altitude
                .push(altitudes.get(i % altitudes.len().max(1)).copied());
            series.heart_rate.push(None);
            series.cadence.push(None);
            series.speed.push(None);
            series.temperature.push(None);
        }
        series
    }

    #[test]
    fn test_fastest_section_constant_speed() {
        // 2.5 m/s constant: 10 m every 4 s over 2 km.
        let series = make_series(201, 10.0, 4, &[400.0]);
        let defs = vec![SectionDef {
            kind: SectionKind::Fastest,
            distances: vec![1_000],
        }];

        let sections = best_sections(&series, &defs);
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        assert_eq!(section.kind, SectionKind::Fastest);
        assert_eq!(section.distance, 1_000);
        assert!((section.max_value - 2.5).abs() < 1e-9);
        assert!(section.end_index > section.start_index);
    }

    #[test]
    fn test_fastest_section_finds_fast_stretch() {
        // First 100 records at 2 m/s, next 150 at 4 m/s, rest at 2 m/s.
        let mut series = TraceSeries::default();
        let mut dist = 0.0;
        for i in 0..400usize {
            let speed = if (100..250).contains(&i) { 4.0 } else { 2.0 };
            if i > 0 {
                dist += speed * 4.0;
            }
            series.timestamps.push(1_000_000 + i as i64 * 4);
            series.latitude.push(Some(47.0));
            series.longitude.push(Some(8.0));
            series.distance.push(Some(dist));
            series.altitude.push(None);
            series.heart_rate.push(None);
            series.cadence.push(None);
            series.speed.push(None);
            series.temperature.push(None);
        }

        let defs = vec![SectionDef {
            kind: SectionKind::Fastest,
            distances: vec![500],
        }];
        let sections = best_sections(&series, &defs);
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        // The best 500 m window lies inside the fast stretch.
        assert!(section.max_value > 3.5, "got {}", section.max_value);
        assert!(section.start_index >= 100);
        assert!(section.end_index <= 251);
    }

    #[test]
    fn test_activity_shorter_than_target() {
        // 500 m total cannot contain a 1 km section.
        let series = make_series(51, 10.0, 4, &[400.0]);
        let defs = vec![SectionDef {
            kind: SectionKind::Fastest,
            distances: vec![1_000],
        }];
        assert!(best_sections(&series, &defs).is_empty());
    }

    #[test]
    fn test_climb_section() {
        // 1 m up every 10 m of travel, one record per 4 s: 15 m/min climb.
        let mut series = make_series(201, 10.0, 4, &[0.0]);
        for (i, alt) in series.altitude.iter_mut().enumerate() {
            *alt = Some(i as f64);
        }
        let defs = vec![SectionDef {
            kind: SectionKind::Climb,
            distances: vec![500],
        }];

        let sections = best_sections(&series, &defs);
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        assert_eq!(section.kind, SectionKind::Climb);
        assert!((section.max_value - 15.0).abs() < 0.5, "got {}", section.max_value);
    }

    #[test]
    fn test_climb_requires_altitude() {
        let mut series = make_series(201, 10.0, 4, &[0.0]);
        for alt in series.altitude.iter_mut() {
            *alt = None;
        }
        let defs = vec![SectionDef {
            kind: SectionKind::Climb,
            distances: vec![100],
        }];
        assert!(best_sections(&series, &defs).is_empty());
    }

    #[test]
    fn test_no_timestamps_no_sections() {
        let mut series = make_series(201, 10.0, 4, &[400.0]);
        series.timestamps.clear();
        assert!(best_sections(&series, &default_sections()).is_empty());
    }

    #[test]
    fn test_missing_distance_values_are_filled() {
        let mut series = make_series(201, 10.0, 4, &[400.0]);
        // Punch holes into the distance series; forward fill bridges them.
        for i in (0..series.distance.len()).step_by(7) {
            series.distance[i] = None;
        }
        let defs = vec![SectionDef {
            kind: SectionKind::Fastest,
            distances: vec![1_000],
        }];
        let sections = best_sections(&series, &defs);
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_section_kind_round_trip() {
        assert_eq!(SectionKind::from_str("fastest"), Some(SectionKind::Fastest));
        assert_eq!(SectionKind::from_str("climb"), Some(SectionKind::Climb));
        assert_eq!(SectionKind::from_str("bogus"), None);
        assert_eq!(SectionKind::Climb.as_str(), "climb");
    }
}
