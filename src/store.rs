//! SQLite-backed activity store.
//!
//! The store owns a single connection and keeps the full import payload:
//! traces (with the time series as a MessagePack blob), activities, laps,
//! and best sections. Schema changes run through `rusqlite_migration`.
//!
//! Write paths are transactional: a trace file lands either completely
//! (trace + laps + activity + best sections) or not at all.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::error::Result;
use crate::model::{BestSection, Lap, ParsedActivity, TraceSeries};
use crate::naming;
use crate::sections::SectionKind;
use crate::sport::{self, SPORT_CATALOG};

const SCHEMA: &str = r#"
    CREATE TABLE sports (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        slug TEXT NOT NULL UNIQUE,
        mapping_name TEXT,
        icon TEXT NOT NULL,
        color TEXT NOT NULL,
        category TEXT,
        has_distance INTEGER NOT NULL DEFAULT 1,
        evaluates_for_awards INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE traces (
        id INTEGER PRIMARY KEY,
        path_to_file TEXT NOT NULL,
        file_name TEXT NOT NULL,
        md5sum TEXT NOT NULL UNIQUE,
        series BLOB NOT NULL,
        calories INTEGER,
        max_altitude REAL,
        min_altitude REAL,
        avg_heart_rate REAL,
        max_heart_rate REAL,
        min_heart_rate REAL,
        avg_cadence REAL,
        max_cadence REAL,
        min_cadence REAL,
        avg_speed REAL,
        max_speed REAL,
        min_speed REAL,
        avg_temperature REAL,
        max_temperature REAL,
        min_temperature REAL,
        total_ascent INTEGER,
        total_descent INTEGER,
        aerobic_training_effect REAL,
        anaerobic_training_effect REAL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT
    );

    CREATE TABLE activities (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        sport_id INTEGER REFERENCES sports(id) ON DELETE SET NULL,
        date TEXT NOT NULL,
        duration_secs INTEGER NOT NULL,
        distance_km REAL,
        trace_id INTEGER NOT NULL UNIQUE REFERENCES traces(id) ON DELETE CASCADE,
        evaluates_for_awards INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT
    );

    CREATE TABLE laps (
        id INTEGER PRIMARY KEY,
        trace_id INTEGER NOT NULL REFERENCES traces(id) ON DELETE CASCADE,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        elapsed_secs REAL NOT NULL,
        lap_trigger TEXT NOT NULL,
        start_lat REAL,
        start_long REAL,
        end_lat REAL,
        end_long REAL,
        distance REAL,
        speed REAL
    );

    CREATE TABLE best_sections (
        id INTEGER PRIMARY KEY,
        activity_id INTEGER NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
        kind TEXT NOT NULL,
        distance INTEGER NOT NULL,
        start_index INTEGER NOT NULL,
        end_index INTEGER NOT NULL,
        max_value REAL NOT NULL,
        UNIQUE (activity_id, kind, distance)
    );

    CREATE TABLE metric_tiles (
        id INTEGER PRIMARY KEY,
        key TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        icon TEXT NOT NULL,
        color TEXT NOT NULL,
        metric_type TEXT NOT NULL,
        data_field TEXT NOT NULL,
        unit TEXT,
        format_type TEXT NOT NULL,
        decimal_places INTEGER NOT NULL DEFAULT 0,
        applicable_to TEXT NOT NULL DEFAULT 'all',
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE INDEX idx_activities_sport ON activities(sport_id);
    CREATE INDEX idx_activities_date ON activities(date);
    CREATE INDEX idx_laps_trace ON laps(trace_id);
    CREATE INDEX idx_best_sections_activity ON best_sections(activity_id);
    CREATE INDEX idx_best_sections_ranking ON best_sections(kind, distance, max_value);
"#;

/// A sport row as stored.
#[derive(Debug, Clone)]
pub struct SportRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub evaluates_for_awards: bool,
}

/// An activity row as stored (series blob not included).
#[derive(Debug, Clone)]
pub struct ActivityRow {
    pub id: i64,
    pub name: String,
    pub sport_id: Option<i64>,
    pub date: DateTime<Utc>,
    pub duration_secs: i64,
    pub distance_km: Option<f64>,
    pub trace_id: i64,
    pub evaluates_for_awards: bool,
}

/// SQLite-backed store for imported activities.
pub struct ActivityStore {
    pub(crate) conn: Connection,
}

impl ActivityStore {
    /// Open (or create) a store at the given database path.
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::migrations().to_latest(&mut conn)?;
        Ok(Self { conn })
    }

    fn migrations() -> Migrations<'static> {
        Migrations::new(vec![M::up(SCHEMA)])
    }

    // ========================================================================
    // Dedup lookups
    // ========================================================================

    /// All checksums currently stored.
    pub fn known_md5sums(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT md5sum FROM traces")?;
        let sums = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(sums)
    }

    pub fn md5_exists(&self, md5sum: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM traces WHERE md5sum = ?1",
            params![md5sum],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// The stored file path behind a checksum, for duplicate reporting.
    pub fn path_for_md5(&self, md5sum: &str) -> Result<Option<String>> {
        let path = self
            .conn
            .query_row(
                "SELECT path_to_file FROM traces WHERE md5sum = ?1",
                params![md5sum],
                |row| row.get(0),
            )
            .optional()?;
        Ok(path)
    }

    // ========================================================================
    // Write paths
    // ========================================================================

    /// Insert a freshly parsed trace file: trace, laps, auto-named activity,
    /// and best sections, in one transaction. Returns the activity id.
    pub fn insert_activity(&mut self, parsed: &ParsedActivity) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let trace_id = insert_trace(&tx, parsed)?;
        insert_laps(&tx, trace_id, &parsed.laps)?;

        let resolved = resolve_sport(&tx, &parsed.sport)?;
        let sport_name = resolved.as_ref().map(|(_, name)| name.as_str());
        let name = naming::automatic_name(&parsed.date, sport_name);

        tx.execute(
            "INSERT INTO activities (name, sport_id, date, duration_secs, distance_km, trace_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                resolved.map(|(id, _)| id),
                parsed.date.to_rfc3339(),
                parsed.duration_secs.round() as i64,
                parsed.distance_km,
                trace_id,
            ],
        )?;
        let activity_id = tx.last_insert_rowid();

        upsert_best_sections(&tx, activity_id, &parsed.best_sections)?;

        tx.commit()?;
        debug!(
            "saved activity '{}' (id {}) from {}",
            name, activity_id, parsed.file_name
        );
        Ok(activity_id)
    }

    /// Overwrite the stored payload of an already-known trace (reimport).
    ///
    /// The activity's duration, distance and date are refreshed; its name is
    /// never touched. Best sections are upserted, and stored sections the
    /// analyzer no longer produces are deleted.
    pub fn update_activity(&mut self, parsed: &ParsedActivity) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let trace_id: i64 = tx.query_row(
            "SELECT id FROM traces WHERE md5sum = ?1",
            params![parsed.md5sum],
            |row| row.get(0),
        )?;

        update_trace(&tx, trace_id, parsed)?;

        // Laps carry no identity of their own; replacing them wholesale is
        // equivalent to a keyed upsert.
        tx.execute("DELETE FROM laps WHERE trace_id = ?1", params![trace_id])?;
        insert_laps(&tx, trace_id, &parsed.laps)?;

        let activity_id: i64 = tx.query_row(
            "SELECT id FROM activities WHERE trace_id = ?1",
            params![trace_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "UPDATE activities
             SET date = ?1, duration_secs = ?2, distance_km = ?3, updated_at = datetime('now')
             WHERE id = ?4",
            params![
                parsed.date.to_rfc3339(),
                parsed.duration_secs.round() as i64,
                parsed.distance_km,
                activity_id,
            ],
        )?;

        upsert_best_sections(&tx, activity_id, &parsed.best_sections)?;
        prune_best_sections(&tx, activity_id, &parsed.best_sections)?;

        tx.commit()?;
        debug!(
            "updated activity {} from {}",
            activity_id, parsed.file_name
        );
        Ok(activity_id)
    }

    // ========================================================================
    // Catalog seeding
    // ========================================================================

    /// Seed the canonical sport catalog. Existing rows are refreshed by
    /// name; returns the number of newly created sports.
    pub fn populate_default_sports(&self) -> Result<usize> {
        let mut created = 0;
        for def in SPORT_CATALOG {
            let exists: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM sports WHERE name = ?1",
                params![def.name],
                |row| row.get(0),
            )?;
            self.conn.execute(
                "INSERT INTO sports (name, slug, mapping_name, icon, color, category,
                                     has_distance, evaluates_for_awards)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(name) DO UPDATE SET
                     icon = excluded.icon,
                     color = excluded.color,
                     category = excluded.category,
                     has_distance = excluded.has_distance",
                params![
                    def.name,
                    sport::slugify(def.name),
                    sport::mapping_name(def.name),
                    def.icon,
                    def.color,
                    def.category,
                    def.has_distance,
                    def.evaluates_for_awards,
                ],
            )?;
            if exists == 0 {
                created += 1;
            }
        }
        Ok(created)
    }

    // ========================================================================
    // Read paths
    // ========================================================================

    pub fn activity_count(&self) -> Result<u32> {
        let count: u32 =
            self.conn
                .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn trace_count(&self) -> Result<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM traces", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All stored activities, newest first.
    pub fn activities(&self) -> Result<Vec<ActivityRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, sport_id, date, duration_secs, distance_km, trace_id,
                    evaluates_for_awards
             FROM activities ORDER BY date DESC",
        )?;
        let rows = stmt
            .query_map([], map_activity_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// The activity belonging to a trace checksum, if any.
    pub fn activity_by_md5(&self, md5sum: &str) -> Result<Option<ActivityRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT a.id, a.name, a.sport_id, a.date, a.duration_secs, a.distance_km,
                        a.trace_id, a.evaluates_for_awards
                 FROM activities a JOIN traces t ON a.trace_id = t.id
                 WHERE t.md5sum = ?1",
                params![md5sum],
                map_activity_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Stored best sections of an activity, ordered by kind and distance.
    pub fn best_sections_for_activity(&self, activity_id: i64) -> Result<Vec<BestSection>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, distance, start_index, end_index, max_value
             FROM best_sections WHERE activity_id = ?1
             ORDER BY kind, distance",
        )?;
        let rows = stmt
            .query_map(params![activity_id], |row| {
                let kind: String = row.get(0)?;
                Ok(BestSection {
                    kind: SectionKind::from_str(&kind).unwrap_or(SectionKind::Fastest),
                    distance: row.get(1)?,
                    start_index: row.get::<_, i64>(2)? as usize,
                    end_index: row.get::<_, i64>(3)? as usize,
                    max_value: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Decode the stored time series of a trace.
    pub fn load_series(&self, trace_id: i64) -> Result<TraceSeries> {
        let blob: Vec<u8> = self.conn.query_row(
            "SELECT series FROM traces WHERE id = ?1",
            params![trace_id],
            |row| row.get(0),
        )?;
        Ok(rmp_serde::from_slice(&blob)?)
    }

    /// All sports, ordered by name.
    pub fn sports(&self) -> Result<Vec<SportRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, slug, evaluates_for_awards FROM sports ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SportRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                    evaluates_for_awards: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn sport_id_by_slug(&self, slug: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM sports WHERE slug = ?1",
                params![slug],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Number of activities per sport, for the catalog listing.
    pub fn activity_count_for_sport(&self, sport_id: i64) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM activities WHERE sport_id = ?1",
            params![sport_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_activity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActivityRow> {
    let date: String = row.get(3)?;
    Ok(ActivityRow {
        id: row.get(0)?,
        name: row.get(1)?,
        sport_id: row.get(2)?,
        date: DateTime::parse_from_rfc3339(&date)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_default(),
        duration_secs: row.get(4)?,
        distance_km: row.get(5)?,
        trace_id: row.get(6)?,
        evaluates_for_awards: row.get(7)?,
    })
}

fn insert_trace(conn: &Connection, parsed: &ParsedActivity) -> Result<i64> {
    let series_blob = rmp_serde::to_vec(&parsed.series)?;
    conn.execute(
        "INSERT INTO traces (
            path_to_file, file_name, md5sum, series, calories,
            max_altitude, min_altitude,
            avg_heart_rate, max_heart_rate, min_heart_rate,
            avg_cadence, max_cadence, min_cadence,
            avg_speed, max_speed, min_speed,
            avg_temperature, max_temperature, min_temperature,
            total_ascent, total_descent,
            aerobic_training_effect, anaerobic_training_effect
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                  ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
        params![
            parsed.path_to_file.to_string_lossy().into_owned(),
            parsed.file_name,
            parsed.md5sum,
            series_blob,
            parsed.calories,
            parsed.altitude_stats.max,
            parsed.altitude_stats.min,
            parsed.heart_rate_stats.avg,
            parsed.heart_rate_stats.max,
            parsed.heart_rate_stats.min,
            parsed.cadence_stats.avg,
            parsed.cadence_stats.max,
            parsed.cadence_stats.min,
            parsed.speed_stats.avg,
            parsed.speed_stats.max,
            parsed.speed_stats.min,
            parsed.temperature_stats.avg,
            parsed.temperature_stats.max,
            parsed.temperature_stats.min,
            parsed.total_ascent,
            parsed.total_descent,
            parsed.aerobic_training_effect,
            parsed.anaerobic_training_effect,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_trace(conn: &Connection, trace_id: i64, parsed: &ParsedActivity) -> Result<()> {
    let series_blob = rmp_serde::to_vec(&parsed.series)?;
    conn.execute(
        "UPDATE traces SET
            path_to_file = ?1, file_name = ?2, series = ?3, calories = ?4,
            max_altitude = ?5, min_altitude = ?6,
            avg_heart_rate = ?7, max_heart_rate = ?8, min_heart_rate = ?9,
            avg_cadence = ?10, max_cadence = ?11, min_cadence = ?12,
            avg_speed = ?13, max_speed = ?14, min_speed = ?15,
            avg_temperature = ?16, max_temperature = ?17, min_temperature = ?18,
            total_ascent = ?19, total_descent = ?20,
            aerobic_training_effect = ?21, anaerobic_training_effect = ?22,
            updated_at = datetime('now')
         WHERE id = ?23",
        params![
            parsed.path_to_file.to_string_lossy().into_owned(),
            parsed.file_name,
            series_blob,
            parsed.calories,
            parsed.altitude_stats.max,
            parsed.altitude_stats.min,
            parsed.heart_rate_stats.avg,
            parsed.heart_rate_stats.max,
            parsed.heart_rate_stats.min,
            parsed.cadence_stats.avg,
            parsed.cadence_stats.max,
            parsed.cadence_stats.min,
            parsed.speed_stats.avg,
            parsed.speed_stats.max,
            parsed.speed_stats.min,
            parsed.temperature_stats.avg,
            parsed.temperature_stats.max,
            parsed.temperature_stats.min,
            parsed.total_ascent,
            parsed.total_descent,
            parsed.aerobic_training_effect,
            parsed.anaerobic_training_effect,
            trace_id,
        ],
    )?;
    Ok(())
}

fn insert_laps(conn: &Connection, trace_id: i64, laps: &[Lap]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO laps (trace_id, start_time, end_time, elapsed_secs, lap_trigger,
                           start_lat, start_long, end_lat, end_long, distance, speed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    for lap in laps {
        stmt.execute(params![
            trace_id,
            lap.start_time.to_rfc3339(),
            lap.end_time.to_rfc3339(),
            lap.elapsed_secs,
            lap.trigger,
            lap.start_lat,
            lap.start_long,
            lap.end_lat,
            lap.end_long,
            lap.distance,
            lap.speed,
        ])?;
    }
    Ok(())
}

/// Resolve a device sport string against the catalog, creating the sport
/// row on first use. Unknown spellings resolve to no sport.
fn resolve_sport(conn: &Connection, device_name: &str) -> Result<Option<(i64, String)>> {
    let Some(def) = sport::lookup(device_name) else {
        debug!("no sport mapping for '{device_name}'");
        return Ok(None);
    };

    // An existing row may have been seeded under its mapping name or slug.
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM sports WHERE mapping_name = ?1 OR slug = ?2",
            params![sport::mapping_name(def.name), sport::slugify(def.name)],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(Some((id, def.name.to_string())));
    }

    conn.execute(
        "INSERT INTO sports (name, slug, mapping_name, icon, color, category,
                             has_distance, evaluates_for_awards)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            def.name,
            sport::slugify(def.name),
            sport::mapping_name(def.name),
            def.icon,
            def.color,
            def.category,
            def.has_distance,
            def.evaluates_for_awards,
        ],
    )?;
    Ok(Some((conn.last_insert_rowid(), def.name.to_string())))
}

fn upsert_best_sections(
    conn: &Connection,
    activity_id: i64,
    sections: &[BestSection],
) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO best_sections (activity_id, kind, distance, start_index, end_index, max_value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(activity_id, kind, distance) DO UPDATE SET
             start_index = excluded.start_index,
             end_index = excluded.end_index,
             max_value = excluded.max_value",
    )?;
    for section in sections {
        stmt.execute(params![
            activity_id,
            section.kind.as_str(),
            section.distance,
            section.start_index as i64,
            section.end_index as i64,
            section.max_value,
        ])?;
    }
    Ok(())
}

/// Delete stored sections the analyzer no longer produces, e.g. after a
/// trace shrank below a window distance.
fn prune_best_sections(
    conn: &Connection,
    activity_id: i64,
    sections: &[BestSection],
) -> Result<()> {
    let keep: HashSet<(String, u32)> = sections
        .iter()
        .map(|s| (s.kind.as_str().to_string(), s.distance))
        .collect();

    let mut stmt = conn.prepare(
        "SELECT id, kind, distance FROM best_sections WHERE activity_id = ?1",
    )?;
    let stored = stmt
        .query_map(params![activity_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (id, kind, distance) in stored {
        if !keep.contains(&(kind.clone(), distance)) {
            debug!(
                "deleting stale best section {kind}/{distance}m of activity {activity_id}"
            );
            conn.execute("DELETE FROM best_sections WHERE id = ?1", params![id])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_activity;

    fn section(kind: SectionKind, distance: u32, value: f64) -> BestSection {
        BestSection {
            kind,
            distance,
            start_index: 0,
            end_index: 10,
            max_value: value,
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut store = ActivityStore::in_memory().unwrap();
        let mut parsed = sample_activity("a1", 100);
        parsed.best_sections = vec![
            section(SectionKind::Fastest, 1_000, 2.5),
            section(SectionKind::Climb, 100, 12.0),
        ];

        let activity_id = store.insert_activity(&parsed).unwrap();
        assert_eq!(store.activity_count().unwrap(), 1);
        assert_eq!(store.trace_count().unwrap(), 1);

        let activity = store.activity_by_md5(&parsed.md5sum).unwrap().unwrap();
        assert_eq!(activity.id, activity_id);
        // 07:30 start, mapped sport: automatic name.
        assert_eq!(activity.name, "Morning Running");
        assert_eq!(activity.duration_secs, 396);
        assert!(activity.sport_id.is_some());

        let sections = store.best_sections_for_activity(activity_id).unwrap();
        assert_eq!(sections.len(), 2);

        let series = store.load_series(activity.trace_id).unwrap();
        assert_eq!(series.len(), 100);
    }

    #[test]
    fn test_md5_lookups() {
        let mut store = ActivityStore::in_memory().unwrap();
        let parsed = sample_activity("a1", 50);
        store.insert_activity(&parsed).unwrap();

        assert!(store.md5_exists(&parsed.md5sum).unwrap());
        assert!(!store.md5_exists("ffffffffffffffffffffffffffffffff").unwrap());
        assert!(store.known_md5sums().unwrap().contains(&parsed.md5sum));
        assert_eq!(
            store.path_for_md5(&parsed.md5sum).unwrap().unwrap(),
            "/traces/a1.fit"
        );
    }

    #[test]
    fn test_update_preserves_name_and_prunes_sections() {
        let mut store = ActivityStore::in_memory().unwrap();
        let mut parsed = sample_activity("a1", 100);
        parsed.best_sections = vec![
            section(SectionKind::Fastest, 1_000, 2.5),
            section(SectionKind::Fastest, 2_000, 2.4),
        ];
        let activity_id = store.insert_activity(&parsed).unwrap();

        // Reimport: shorter trace, faster kilometer, no 2 km section anymore.
        parsed.duration_secs = 200.0;
        parsed.distance_km = Some(0.9);
        parsed.best_sections = vec![section(SectionKind::Fastest, 1_000, 3.1)];
        let updated_id = store.update_activity(&parsed).unwrap();
        assert_eq!(updated_id, activity_id);

        let activity = store.activity_by_md5(&parsed.md5sum).unwrap().unwrap();
        assert_eq!(activity.name, "Morning Running");
        assert_eq!(activity.duration_secs, 200);
        assert_eq!(activity.distance_km, Some(0.9));

        let sections = store.best_sections_for_activity(activity_id).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].max_value, 3.1);
        assert_eq!(store.activity_count().unwrap(), 1);
    }

    #[test]
    fn test_unknown_sport_leaves_activity_unmapped() {
        let mut store = ActivityStore::in_memory().unwrap();
        let mut parsed = sample_activity("a1", 50);
        parsed.sport = "underwater_basket_weaving".to_string();
        store.insert_activity(&parsed).unwrap();

        let activity = store.activity_by_md5(&parsed.md5sum).unwrap().unwrap();
        assert!(activity.sport_id.is_none());
        assert_eq!(activity.name, "Morning Workout");
    }

    #[test]
    fn test_resolve_sport_reuses_rows() {
        let mut store = ActivityStore::in_memory().unwrap();
        let mut first = sample_activity("a1", 50);
        first.sport = "running".to_string();
        let mut second = sample_activity("a2", 50);
        second.sport = "run".to_string();

        store.insert_activity(&first).unwrap();
        store.insert_activity(&second).unwrap();

        let running: Vec<SportRow> = store
            .sports()
            .unwrap()
            .into_iter()
            .filter(|s| s.name == "Running")
            .collect();
        assert_eq!(running.len(), 1);
        assert_eq!(
            store.activity_count_for_sport(running[0].id).unwrap(),
            2
        );
    }

    #[test]
    fn test_populate_default_sports_is_idempotent() {
        let store = ActivityStore::in_memory().unwrap();
        store.populate_default_sports().unwrap();
        let count_after_first = store.sports().unwrap().len();
        assert_eq!(count_after_first, SPORT_CATALOG.len());

        store.populate_default_sports().unwrap();
        assert_eq!(store.sports().unwrap().len(), count_after_first);
    }

    #[test]
    fn test_sport_id_by_slug() {
        let store = ActivityStore::in_memory().unwrap();
        store.populate_default_sports().unwrap();
        assert!(store.sport_id_by_slug("trail-running").unwrap().is_some());
        assert!(store.sport_id_by_slug("quidditch").unwrap().is_none());
    }
}
