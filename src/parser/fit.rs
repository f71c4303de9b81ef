//! FIT file parsing.
//!
//! Decoding of the binary container is delegated to the `fitparser` crate;
//! this module walks the decoded messages and extracts the record time
//! series, session summary, and laps. Field names follow the FIT profile.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};

use crate::error::{Error, Result};
use crate::model::{Lap, ParsedActivity, SeriesStats, TraceSeries};

/// FIT encodes coordinates as signed 32-bit semicircles.
const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// Parse a decompressed FIT payload.
pub fn parse(data: &[u8], path: &Path, md5sum: &str) -> Result<ParsedActivity> {
    let records = fitparser::from_bytes(data)?;

    let mut series = TraceSeries::default();
    let mut laps: Vec<Lap> = Vec::new();
    let mut session: Option<HashMap<String, Value>> = None;

    for record in &records {
        match record.kind() {
            MesgNum::Record => push_record(&mut series, record),
            MesgNum::Lap => {
                if let Some(lap) = extract_lap(record) {
                    laps.push(lap);
                }
            }
            MesgNum::Session => {
                // Multi-session files keep the first session as the summary.
                if session.is_none() {
                    session = Some(owned_field_map(record));
                }
            }
            _ => {}
        }
    }

    if series.is_empty() {
        return Err(Error::EmptyTrace(path.to_path_buf()));
    }

    let session = session.unwrap_or_default();

    let sport = session
        .get("sport")
        .and_then(value_as_string)
        .unwrap_or_else(|| "unknown".to_string())
        .to_lowercase();

    let date = session
        .get("start_time")
        .and_then(value_as_timestamp)
        .or_else(|| {
            series
                .timestamps
                .first()
                .and_then(|ts| DateTime::from_timestamp(*ts, 0))
        })
        .ok_or_else(|| Error::EmptyTrace(path.to_path_buf()))?;

    let duration_secs = session
        .get("total_elapsed_time")
        .or_else(|| session.get("total_timer_time"))
        .and_then(value_as_f64)
        .unwrap_or_else(|| {
            let first = series.timestamps.first().copied().unwrap_or(0);
            let last = series.timestamps.last().copied().unwrap_or(first);
            (last - first) as f64
        });

    let distance_km = session
        .get("total_distance")
        .and_then(value_as_f64)
        .or_else(|| series.distance.iter().flatten().last().copied())
        .map(|m| m / 1000.0);

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
        distance_km,
        calories: session.get("total_calories").and_then(value_as_u32),
        total_ascent: session.get("total_ascent").and_then(value_as_u32),
        total_descent: session.get("total_descent").and_then(value_as_u32),
        aerobic_training_effect: session
            .get("total_training_effect")
            .and_then(value_as_f64),
        anaerobic_training_effect: session
            .get("total_anaerobic_training_effect")
            .and_then(value_as_f64),
        altitude_stats: SeriesStats::default(),
        heart_rate_stats: SeriesStats::default(),
        cadence_stats: SeriesStats::default(),
        speed_stats: SeriesStats::default(),
        temperature_stats: SeriesStats::default(),
        series,
        laps,
        best_sections: Vec::new(),
    };
    activity.compute_stats();

    // A session summary can carry heart rate even when the records don't
    // (e.g. broadcast-only straps paired during a pool swim).
    if activity.heart_rate_stats.avg.is_none() {
        activity.heart_rate_stats.avg = session.get("avg_heart_rate").and_then(value_as_f64);
        activity.heart_rate_stats.max = session.get("max_heart_rate").and_then(value_as_f64);
    }

    Ok(activity)
}

/// Append one `record` message to the series. Records without a timestamp
/// are dropped; the series stays aligned on timestamps.
fn push_record(series: &mut TraceSeries, record: &FitDataRecord) {
    let fields = field_map(record);
    let Some(ts) = fields.get("timestamp").and_then(|v| value_as_timestamp(v)) else {
        return;
    };

    series.timestamps.push(ts.timestamp());
    series.latitude.push(
        fields
            .get("position_lat")
            .and_then(|v| value_as_f64(v))
            .map(|v| v * SEMICIRCLES_TO_DEGREES),
    );
    series.longitude.push(
        fields
            .get("position_long")
            .and_then(|v| value_as_f64(v))
            .map(|v| v * SEMICIRCLES_TO_DEGREES),
    );
    series
        .distance
        .push(fields.get("distance").and_then(|v| value_as_f64(v)));
    series.altitude.push(
        fields
            .get("enhanced_altitude")
            .or_else(|| fields.get("altitude"))
            .and_then(|v| value_as_f64(v)),
    );
    series
        .heart_rate
        .push(fields.get("heart_rate").and_then(|v| value_as_f64(v)));
    series
        .cadence
        .push(fields.get("cadence").and_then(|v| value_as_f64(v)));
    series.speed.push(
        fields
            .get("enhanced_speed")
            .or_else(|| fields.get("speed"))
            .and_then(|v| value_as_f64(v)),
    );
    series
        .temperature
        .push(fields.get("temperature").and_then(|v| value_as_f64(v)));
}

/// Extract a lap from a `lap` message. Laps without timing are dropped.
fn extract_lap(record: &FitDataRecord) -> Option<Lap> {
    let fields = field_map(record);
    let start_time = fields.get("start_time").and_then(|v| value_as_timestamp(v))?;
    // The lap's own timestamp marks its end.
    let end_time = fields.get("timestamp").and_then(|v| value_as_timestamp(v))?;
    let elapsed_secs = fields
        .get("total_elapsed_time")
        .and_then(|v| value_as_f64(v))
        .unwrap_or_else(|| (end_time - start_time).num_seconds() as f64);

    Some(Lap {
        start_time,
        end_time,
        elapsed_secs,
        trigger: fields
            .get("lap_trigger")
            .and_then(|v| value_as_string(v))
            .unwrap_or_else(|| "unknown".to_string()),
        start_lat: fields
            .get("start_position_lat")
            .and_then(|v| value_as_f64(v))
            .map(|v| v * SEMICIRCLES_TO_DEGREES),
        start_long: fields
            .get("start_position_long")
            .and_then(|v| value_as_f64(v))
            .map(|v| v * SEMICIRCLES_TO_DEGREES),
        end_lat: fields
            .get("end_position_lat")
            .and_then(|v| value_as_f64(v))
            .map(|v| v * SEMICIRCLES_TO_DEGREES),
        end_long: fields
            .get("end_position_long")
            .and_then(|v| value_as_f64(v))
            .map(|v| v * SEMICIRCLES_TO_DEGREES),
        distance: fields.get("total_distance").and_then(|v| value_as_f64(v)),
        speed: fields
            .get("enhanced_avg_speed")
            .or_else(|| fields.get("avg_speed"))
            .and_then(|v| value_as_f64(v)),
    })
}

fn field_map(record: &FitDataRecord) -> HashMap<&str, &Value> {
    record
        .fields()
        .iter()
        .map(|f| (f.name(), f.value()))
        .collect()
}

fn owned_field_map(record: &FitDataRecord) -> HashMap<String, Value> {
    record
        .fields()
        .iter()
        .map(|f| (f.name().to_string(), f.value().clone()))
        .collect()
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::SInt8(v) => Some(f64::from(*v)),
        Value::UInt8(v) => Some(f64::from(*v)),
        Value::UInt8z(v) => Some(f64::from(*v)),
        Value::SInt16(v) => Some(f64::from(*v)),
        Value::UInt16(v) => Some(f64::from(*v)),
        Value::UInt16z(v) => Some(f64::from(*v)),
        Value::SInt32(v) => Some(f64::from(*v)),
        Value::UInt32(v) => Some(f64::from(*v)),
        Value::UInt32z(v) => Some(f64::from(*v)),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::UInt64z(v) => Some(*v as f64),
        Value::Float32(v) => Some(f64::from(*v)),
        Value::Float64(v) => Some(*v),
        Value::Byte(v) => Some(f64::from(*v)),
        Value::Enum(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn value_as_u32(value: &Value) -> Option<u32> {
    value_as_f64(value).map(|v| v.max(0.0).round() as u32)
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn value_as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(ts.with_timezone(&Utc)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicircle_conversion() {
        // 90° north is a quarter of the signed 32-bit range.
        let semicircles = 1_073_741_824.0;
        assert!((semicircles * SEMICIRCLES_TO_DEGREES - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(value_as_f64(&Value::UInt16(150)), Some(150.0));
        assert_eq!(value_as_f64(&Value::Float64(3.25)), Some(3.25));
        assert_eq!(value_as_f64(&Value::String("x".to_string())), None);
        assert_eq!(value_as_u32(&Value::SInt16(-3)), Some(0));
        assert_eq!(
            value_as_string(&Value::String("running".to_string())),
            Some("running".to_string())
        );
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.fit");
        let result = parse(b"no fit header here", &path, "0");
        assert!(matches!(result, Err(Error::Fit(_))));
    }
}
