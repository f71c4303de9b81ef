//! Configurable metric tiles.
//!
//! A tile names one aggregate over the stored activities (total distance,
//! average heart rate, 7-day trend, ...) plus display metadata. Tile
//! definitions live in the store; the calculator evaluates them with
//! optional sport and trailing-days filters and formats the result.

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::ActivityStore;

/// How a tile aggregates its data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Total,
    Average,
    Count,
    Max,
    Min,
    /// Sum over the trailing 7 days.
    Trend,
    /// Calculated from several fields (currently: average pace).
    Custom,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Total => "total",
            MetricType::Average => "average",
            MetricType::Count => "count",
            MetricType::Max => "max",
            MetricType::Min => "min",
            MetricType::Trend => "trend",
            MetricType::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "total" => Some(MetricType::Total),
            "average" => Some(MetricType::Average),
            "count" => Some(MetricType::Count),
            "max" => Some(MetricType::Max),
            "min" => Some(MetricType::Min),
            "trend" => Some(MetricType::Trend),
            "custom" => Some(MetricType::Custom),
            _ => None,
        }
    }
}

/// How a tile value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Number,
    Decimal,
    Duration,
    Custom,
}

impl FormatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatType::Number => "number",
            FormatType::Decimal => "decimal",
            FormatType::Duration => "duration",
            FormatType::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "number" => Some(FormatType::Number),
            "decimal" => Some(FormatType::Decimal),
            "duration" => Some(FormatType::Duration),
            "custom" => Some(FormatType::Custom),
            _ => None,
        }
    }
}

/// A metric tile definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricTile {
    pub key: String,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub metric_type: MetricType,
    pub data_field: String,
    pub unit: Option<String>,
    pub format_type: FormatType,
    pub decimal_places: u8,
    /// "all" or "sport" (only meaningful with a sport filter).
    pub applicable_to: String,
}

/// A tile evaluated against the store.
#[derive(Debug, Clone, Serialize)]
pub struct TileValue {
    pub tile: MetricTile,
    pub value: f64,
    pub formatted: String,
}

/// The default tile catalog.
pub fn default_tiles() -> Vec<MetricTile> {
    fn tile(
        key: &str,
        name: &str,
        title: &str,
        description: &str,
        icon: &str,
        color: &str,
        metric_type: MetricType,
        data_field: &str,
        unit: Option<&str>,
        format_type: FormatType,
        decimal_places: u8,
        applicable_to: &str,
    ) -> MetricTile {
        MetricTile {
            key: key.to_string(),
            name: name.to_string(),
            title: title.to_string(),
            description: Some(description.to_string()),
            icon: icon.to_string(),
            color: color.to_string(),
            metric_type,
            data_field: data_field.to_string(),
            unit: unit.map(str::to_string),
            format_type,
            decimal_places,
            applicable_to: applicable_to.to_string(),
        }
    }

    vec![
        tile(
            "total_distance", "Total Distance", "Distance", "Total distance covered",
            "fa-road", "#4ECDC4", MetricType::Total, "distance", Some("km"),
            FormatType::Decimal, 2, "all",
        ),
        tile(
            "total_duration", "Total Duration", "Duration", "Total time spent on activities",
            "fa-clock", "#FF6B6B", MetricType::Total, "duration", Some("hours"),
            FormatType::Duration, 0, "all",
        ),
        tile(
            "activity_count", "Activity Count", "Activities", "Number of activities",
            "fa-hashtag", "#45B7D1", MetricType::Count, "id", None,
            FormatType::Number, 0, "all",
        ),
        tile(
            "total_calories", "Total Calories", "Calories", "Total calories burned",
            "fa-fire", "#FF8C42", MetricType::Total, "calories", Some("kcal"),
            FormatType::Number, 0, "all",
        ),
        tile(
            "avg_distance", "Average Distance", "Avg Distance", "Average distance per activity",
            "fa-route", "#96CEB4", MetricType::Average, "distance", Some("km"),
            FormatType::Decimal, 2, "all",
        ),
        tile(
            "avg_duration", "Average Duration", "Avg Duration", "Average duration per activity",
            "fa-stopwatch", "#FFEAA7", MetricType::Average, "duration", Some("minutes"),
            FormatType::Duration, 0, "all",
        ),
        tile(
            "avg_heart_rate", "Average Heart Rate", "Avg Heart Rate", "Average heart rate",
            "fa-heartbeat", "#E17055", MetricType::Average, "average_heart_rate", Some("bpm"),
            FormatType::Number, 0, "all",
        ),
        tile(
            "max_heart_rate", "Max Heart Rate", "Max Heart Rate", "Maximum heart rate achieved",
            "fa-heartbeat", "#D63031", MetricType::Max, "max_heart_rate", Some("bpm"),
            FormatType::Number, 0, "sport",
        ),
        tile(
            "longest_activity", "Longest Activity", "Longest", "Longest single activity",
            "fa-trophy", "#FDCB6E", MetricType::Max, "distance", Some("km"),
            FormatType::Decimal, 2, "sport",
        ),
        tile(
            "weekly_trend", "Weekly Trend", "7-Day Trend", "Activity trend over the last 7 days",
            "fa-chart-line", "#74B9FF", MetricType::Trend, "duration", Some("hours"),
            FormatType::Duration, 1, "all",
        ),
        tile(
            "avg_pace", "Average Pace", "Avg Pace", "Average pace across all runs",
            "fa-running", "#00B894", MetricType::Custom, "duration,distance", Some("min/km"),
            FormatType::Custom, 0, "sport",
        ),
    ]
}

impl ActivityStore {
    /// Seed the default tile catalog. Existing tiles are refreshed by key;
    /// returns the number of newly created tiles.
    pub fn populate_default_tiles(&self) -> Result<usize> {
        let mut created = 0;
        for tile in default_tiles() {
            let exists: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM metric_tiles WHERE key = ?1",
                params![tile.key],
                |row| row.get(0),
            )?;
            self.conn.execute(
                "INSERT INTO metric_tiles (key, name, title, description, icon, color,
                                           metric_type, data_field, unit, format_type,
                                           decimal_places, applicable_to)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(key) DO UPDATE SET
                     name = excluded.name,
                     title = excluded.title,
                     description = excluded.description,
                     icon = excluded.icon,
                     color = excluded.color,
                     metric_type = excluded.metric_type,
                     data_field = excluded.data_field,
                     unit = excluded.unit,
                     format_type = excluded.format_type,
                     decimal_places = excluded.decimal_places,
                     applicable_to = excluded.applicable_to",
                params![
                    tile.key,
                    tile.name,
                    tile.title,
                    tile.description,
                    tile.icon,
                    tile.color,
                    tile.metric_type.as_str(),
                    tile.data_field,
                    tile.unit,
                    tile.format_type.as_str(),
                    tile.decimal_places,
                    tile.applicable_to,
                ],
            )?;
            if exists == 0 {
                created += 1;
            }
        }
        Ok(created)
    }

    /// All active tile definitions.
    pub fn metric_tiles(&self) -> Result<Vec<MetricTile>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, name, title, description, icon, color, metric_type, data_field,
                    unit, format_type, decimal_places, applicable_to
             FROM metric_tiles WHERE is_active = 1 ORDER BY name",
        )?;
        let tiles = stmt
            .query_map([], |row| {
                let metric_type: String = row.get(6)?;
                let format_type: String = row.get(9)?;
                Ok(MetricTile {
                    key: row.get(0)?,
                    name: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    icon: row.get(4)?,
                    color: row.get(5)?,
                    metric_type: MetricType::from_str(&metric_type)
                        .unwrap_or(MetricType::Count),
                    data_field: row.get(7)?,
                    unit: row.get(8)?,
                    format_type: FormatType::from_str(&format_type)
                        .unwrap_or(FormatType::Number),
                    decimal_places: row.get(10)?,
                    applicable_to: row.get(11)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tiles)
    }
}

/// Evaluates metric tiles against a store, with optional filters.
pub struct TileCalculator<'a> {
    store: &'a ActivityStore,
    sport_id: Option<i64>,
    days_limit: Option<u32>,
}

impl<'a> TileCalculator<'a> {
    pub fn new(store: &'a ActivityStore) -> Self {
        Self {
            store,
            sport_id: None,
            days_limit: None,
        }
    }

    pub fn with_sport(mut self, sport_id: i64) -> Self {
        self.sport_id = Some(sport_id);
        self
    }

    pub fn with_days_limit(mut self, days: u32) -> Self {
        self.days_limit = Some(days);
        self
    }

    /// Evaluate every applicable tile in the store's catalog.
    pub fn calculate_all(&self) -> Result<Vec<TileValue>> {
        let mut values = Vec::new();
        for tile in self.store.metric_tiles()? {
            if tile.applicable_to == "sport" && self.sport_id.is_none() {
                continue;
            }
            values.push(self.calculate(&tile)?);
        }
        Ok(values)
    }

    /// Evaluate one tile.
    pub fn calculate(&self, tile: &MetricTile) -> Result<TileValue> {
        let value = match tile.metric_type {
            MetricType::Total => self.scaled_aggregate("SUM", tile, self.since())?,
            MetricType::Average => self.scaled_aggregate("AVG", tile, self.since())?,
            MetricType::Max => self.scaled_aggregate("MAX", tile, self.since())?,
            MetricType::Min => self.scaled_aggregate("MIN", tile, self.since())?,
            MetricType::Count => self.count(self.since())?,
            MetricType::Trend => self.scaled_aggregate("SUM", tile, self.trend_since())?,
            MetricType::Custom => self.custom(tile)?,
        };
        Ok(TileValue {
            tile: tile.clone(),
            value,
            formatted: format_value(value, tile),
        })
    }

    fn since(&self) -> Option<String> {
        self.days_limit
            .map(|days| (Utc::now() - Duration::days(i64::from(days))).to_rfc3339())
    }

    /// Trend windows are 7 days, clamped by an explicit days limit.
    fn trend_since(&self) -> Option<String> {
        let week = Utc::now() - Duration::days(7);
        match self.days_limit {
            Some(days) if i64::from(days) < 7 => Some((Utc::now() - Duration::days(i64::from(days))).to_rfc3339()),
            _ => Some(week.to_rfc3339()),
        }
    }

    /// Aggregate with duration unit scaling applied.
    fn scaled_aggregate(&self, func: &str, tile: &MetricTile, since: Option<String>) -> Result<f64> {
        let Some(expr) = field_expr(&tile.data_field) else {
            return Ok(0.0);
        };
        let raw = self.aggregate(func, expr, since)?.unwrap_or(0.0);
        Ok(scale_for_unit(raw, tile))
    }

    fn aggregate(&self, func: &str, expr: &str, since: Option<String>) -> Result<Option<f64>> {
        // `func` and `expr` come from fixed whitelists, never from tile data.
        let sql = format!(
            "SELECT {func}({expr})
             FROM activities a JOIN traces t ON a.trace_id = t.id
             WHERE (?1 IS NULL OR a.sport_id = ?1)
               AND (?2 IS NULL OR a.date >= ?2)"
        );
        let value = self
            .store
            .conn
            .query_row(&sql, params![self.sport_id, since], |row| {
                row.get::<_, Option<f64>>(0)
            })
            .optional()?
            .flatten();
        Ok(value)
    }

    fn count(&self, since: Option<String>) -> Result<f64> {
        let count: i64 = self.store.conn.query_row(
            "SELECT COUNT(*)
             FROM activities a
             WHERE (?1 IS NULL OR a.sport_id = ?1)
               AND (?2 IS NULL OR a.date >= ?2)",
            params![self.sport_id, since],
            |row| row.get(0),
        )?;
        Ok(count as f64)
    }

    fn custom(&self, tile: &MetricTile) -> Result<f64> {
        match tile.key.as_str() {
            "avg_pace" => {
                let since = self.since();
                let total_km = self
                    .aggregate("SUM", "a.distance_km", since.clone())?
                    .unwrap_or(0.0);
                let total_secs = self
                    .aggregate("SUM", "a.duration_secs", since)?
                    .unwrap_or(0.0);
                if total_km > 0.0 && total_secs > 0.0 {
                    Ok((total_secs / 60.0) / total_km)
                } else {
                    Ok(0.0)
                }
            }
            _ => Ok(0.0),
        }
    }
}

/// Convert raw aggregate values into the tile's display unit.
fn scale_for_unit(value: f64, tile: &MetricTile) -> f64 {
    if tile.data_field != "duration" {
        return value;
    }
    match tile.unit.as_deref() {
        Some("hours") => value / 3600.0,
        Some("minutes") => value / 60.0,
        _ => value,
    }
}

/// Render a tile value according to its format type.
fn format_value(value: f64, tile: &MetricTile) -> String {
    match tile.format_type {
        FormatType::Number => format!("{}", value as i64),
        FormatType::Decimal => format!("{:.*}", tile.decimal_places as usize, value),
        FormatType::Duration => match tile.unit.as_deref() {
            Some("hours") => {
                let hours = value as i64;
                let minutes = ((value - hours as f64) * 60.0) as i64;
                format!("{hours}h {minutes}m")
            }
            Some("minutes") => format!("{}m", value as i64),
            _ => format!("{value:.1}"),
        },
        FormatType::Custom => {
            if tile.key == "avg_pace" {
                let minutes = value as i64;
                let seconds = ((value - minutes as f64) * 60.0) as i64;
                format!("{minutes}:{seconds:02}")
            } else {
                format!("{value}")
            }
        }
    }
}

/// Whitelisted data fields and the SQL expressions they map to.
fn field_expr(data_field: &str) -> Option<&'static str> {
    match data_field {
        "distance" => Some("a.distance_km"),
        "duration" => Some("a.duration_secs"),
        "calories" => Some("t.calories"),
        "average_heart_rate" => Some("t.avg_heart_rate"),
        "max_heart_rate" => Some("t.max_heart_rate"),
        _ => None,
    }
}
