//! Awards: top best sections and top ascents per sport.
//!
//! Rankings follow the opt-out flags: sports and individual activities can
//! both be excluded from awards evaluation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::config::ImportConfig;
use crate::error::Result;
use crate::sections::SectionKind;
use crate::store::{ActivityStore, SportRow};

/// One ranked best section.
#[derive(Debug, Clone)]
pub struct SectionAward {
    pub activity_id: i64,
    pub activity_name: String,
    pub activity_date: DateTime<Utc>,
    pub kind: SectionKind,
    /// Window distance in meters.
    pub distance: u32,
    pub max_value: f64,
    /// 1 = best.
    pub rank: u32,
}

/// One ranked total-ascent entry.
#[derive(Debug, Clone)]
pub struct AscentAward {
    pub activity_id: i64,
    pub activity_name: String,
    pub total_ascent: u32,
    pub rank: u32,
}

impl ActivityStore {
    /// Sports participating in awards, ordered by name.
    pub fn awards_sports(&self) -> Result<Vec<SportRow>> {
        Ok(self
            .sports()?
            .into_iter()
            .filter(|s| s.evaluates_for_awards)
            .collect())
    }

    /// Top best sections of one sport for a (kind, distance) pair.
    pub fn top_sections_for_sport(
        &self,
        sport_id: i64,
        kind: SectionKind,
        distance: u32,
        limit: usize,
    ) -> Result<Vec<SectionAward>> {
        let mut stmt = self.conn.prepare(
            "SELECT bs.activity_id, a.name, a.date, bs.max_value
             FROM best_sections bs
             JOIN activities a ON bs.activity_id = a.id
             WHERE a.sport_id = ?1
               AND a.evaluates_for_awards = 1
               AND bs.kind = ?2
               AND bs.distance = ?3
             ORDER BY bs.max_value DESC
             LIMIT ?4",
        )?;
        let rows = stmt
            .query_map(
                params![sport_id, kind.as_str(), distance, limit as i64],
                |row| {
                    let date: String = row.get(2)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        date,
                        row.get::<_, f64>(3)?,
                    ))
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, (activity_id, activity_name, date, max_value))| SectionAward {
                activity_id,
                activity_name,
                activity_date: DateTime::parse_from_rfc3339(&date)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_default(),
                kind,
                distance,
                max_value,
                rank: i as u32 + 1,
            })
            .collect())
    }

    /// Top total-ascent activities of one sport.
    pub fn top_ascent_for_sport(&self, sport_id: i64, limit: usize) -> Result<Vec<AscentAward>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.name, t.total_ascent
             FROM activities a
             JOIN traces t ON a.trace_id = t.id
             WHERE a.sport_id = ?1
               AND a.evaluates_for_awards = 1
               AND t.total_ascent IS NOT NULL
             ORDER BY t.total_ascent DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![sport_id, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, (activity_id, activity_name, total_ascent))| AscentAward {
                activity_id,
                activity_name,
                total_ascent,
                rank: i as u32 + 1,
            })
            .collect())
    }

    /// Exclude or include a single activity from awards evaluation.
    pub fn set_activity_evaluates_for_awards(
        &self,
        activity_id: i64,
        evaluates: bool,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE activities SET evaluates_for_awards = ?1, updated_at = datetime('now')
             WHERE id = ?2",
            params![evaluates, activity_id],
        )?;
        Ok(())
    }
}

/// Top best sections of every awards sport, for the given kinds, keyed by
/// sport name. Sports without any matching section are omitted.
pub fn top_awards_for_all_sports(
    store: &ActivityStore,
    config: &ImportConfig,
    kinds: &[SectionKind],
) -> Result<BTreeMap<String, Vec<SectionAward>>> {
    let mut awards = BTreeMap::new();
    for sport in store.awards_sports()? {
        let mut sport_awards = Vec::new();
        for def in &config.sections {
            if !kinds.contains(&def.kind) {
                continue;
            }
            for &distance in &def.distances {
                sport_awards.extend(store.top_sections_for_sport(
                    sport.id,
                    def.kind,
                    distance,
                    config.rank_limit,
                )?);
            }
        }
        if !sport_awards.is_empty() {
            awards.insert(sport.name, sport_awards);
        }
    }
    Ok(awards)
}

/// Top total-ascent activities of every awards sport, keyed by sport name.
pub fn top_ascent_awards_for_all_sports(
    store: &ActivityStore,
    limit: usize,
) -> Result<BTreeMap<String, Vec<AscentAward>>> {
    let mut awards = BTreeMap::new();
    for sport in store.awards_sports()? {
        let entries = store.top_ascent_for_sport(sport.id, limit)?;
        if !entries.is_empty() {
            awards.insert(sport.name, entries);
        }
    }
    Ok(awards)
}

/// The rank of an activity within its sport's ascent awards, if it places.
pub fn ascent_ranking_of_activity(
    store: &ActivityStore,
    activity_id: i64,
    limit: usize,
) -> Result<Option<u32>> {
    let sport_id: Option<i64> = {
        use rusqlite::OptionalExtension;
        store
            .conn
            .query_row(
                "SELECT sport_id FROM activities WHERE id = ?1",
                params![activity_id],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten()
    };
    let Some(sport_id) = sport_id else {
        return Ok(None);
    };
    Ok(store
        .top_ascent_for_sport(sport_id, limit)?
        .into_iter()
        .find(|award| award.activity_id == activity_id)
        .map(|award| award.rank))
}
