//! GPX file parsing.
//!
//! XML decoding is delegated to the georust `gpx` crate. GPX tracks carry
//! only coordinates, elevation and (usually) timestamps, so cumulative
//! distance, speed, and ascent/descent are derived here: distance with
//! haversine, speed from distance/time deltas.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine, Point};

use crate::error::{Error, Result};
use crate::model::{ParsedActivity, SeriesStats, TraceSeries};

struct RawPoint {
    lat: f64,
    lon: f64,
    elevation: Option<f64>,
    time: Option<i64>,
}

/// Parse a decompressed GPX payload.
pub fn parse(data: &[u8], path: &Path, md5sum: &str) -> Result<ParsedActivity> {
    let gpx_data = gpx::read(data)?;

    let sport = gpx_data
        .tracks
        .iter()
        .find_map(|t| t.type_.clone())
        .unwrap_or_else(|| "unknown".to_string())
        .to_lowercase();

    let mut points: Vec<RawPoint> = Vec::new();
    for track in &gpx_data.tracks {
        for segment in &track.segments {
            for wp in &segment.points {
                let p = wp.point();
                points.push(RawPoint {
                    lat: p.y(),
                    lon: p.x(),
                    elevation: wp.elevation,
                    time: wp.time.as_ref().and_then(parse_time),
                });
            }
        }
    }

    if points.is_empty() {
        return Err(Error::EmptyTrace(path.to_path_buf()));
    }

    let all_timed = points.iter().all(|p| p.time.is_some());

    let mut series = TraceSeries::default();
    let mut cumulative = 0.0;
    let mut prev: Option<&RawPoint> = None;
    let mut total_ascent = 0.0;
    let mut total_descent = 0.0;

    for point in &points {
        if let Some(prev) = prev {
            cumulative += Haversine::distance(
                Point::new(prev.lon, prev.lat),
                Point::new(point.lon, point.lat),
            );
            if let (Some(a), Some(b)) = (prev.elevation, point.elevation) {
                let delta = b - a;
                if delta > 0.0 {
                    total_ascent += delta;
                } else {
                    total_descent -= delta;
                }
            }
        }

        series.latitude.push(Some(point.lat));
        series.longitude.push(Some(point.lon));
        series.distance.push(Some(cumulative));
        series.altitude.push(point.elevation);
        series.heart_rate.push(None);
        series.cadence.push(None);
        series.temperature.push(None);

        let speed = match (prev, point.time) {
            (Some(p), Some(t)) => p.time.and_then(|pt| {
                let dt = t - pt;
                let dd = cumulative - series.distance[series.distance.len() - 2].unwrap_or(0.0);
                (dt > 0).then(|| dd / dt as f64)
            }),
            _ => None,
        };
        series.speed.push(speed);

        if all_timed {
            // Safe: all points carry a time when all_timed holds.
            if let Some(t) = point.time {
                series.timestamps.push(t);
            }
        }
        prev = Some(point);
    }

    let first_time = points.iter().find_map(|p| p.time);
    let last_time = points.iter().rev().find_map(|p| p.time);

    let date = first_time
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .or_else(|| file_mtime(path))
        .unwrap_or_else(Utc::now);

    let duration_secs = match (first_time, last_time) {
        (Some(first), Some(last)) if last > first => (last - first) as f64,
        _ => 0.0,
    };

    let mut activity = ParsedActivity {
        path_to_file: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        md5sum: md5sum.to_string(),
        sport,
        date,
        duration_secs,
        distance_km: Some(cumulative / 1000.0),
        calories: None,
        total_ascent: (total_ascent > 0.0).then(|| total_ascent.round() as u32),
        total_descent: (total_descent > 0.0).then(|| total_descent.round() as u32),
        aerobic_training_effect: None,
        anaerobic_training_effect: None,
        altitude_stats: SeriesStats::default(),
        heart_rate_stats: SeriesStats::default(),
        cadence_stats: SeriesStats::default(),
        speed_stats: SeriesStats::default(),
        temperature_stats: SeriesStats::default(),
        series,
        laps: Vec::new(),
        best_sections: Vec::new(),
    };
    activity.compute_stats();
    Ok(activity)
}

fn parse_time(time: &gpx::Time) -> Option<i64> {
    let formatted = time.format().ok()?;
    DateTime::parse_from_rfc3339(&formatted)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp())
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
