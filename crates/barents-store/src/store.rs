//! Persistence operations for the sighting log.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use barents_types::Sighting;

use crate::error::StoreError;

/// Columns selected by every sighting query, in [`sighting_from_row`] order.
const SIGHTING_COLUMNS: &str = "name, mmsi, lat, lon, speed, heading, course, nav_status, seen_at";

/// Maps one row of [`SIGHTING_COLUMNS`] to a [`Sighting`].
fn sighting_from_row(row: &Row<'_>) -> rusqlite::Result<Sighting> {
    Ok(Sighting {
        name: row.get(0)?,
        mmsi: row.get(1)?,
        lat: row.get(2)?,
        lon: row.get(3)?,
        speed: row.get(4)?,
        heading: row.get(5)?,
        course: row.get(6)?,
        nav_status: row.get(7)?,
        seen_at: row.get(8)?,
    })
}

/// Appends one sighting to the log and returns its row id.
///
/// The insert has committed when this returns `Ok` — under WAL mode that
/// is the durability point the ingestion pipeline relies on before
/// broadcasting the sighting to live viewers.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn append_sighting(conn: &Connection, sighting: &Sighting) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO sightings (name, mmsi, lat, lon, speed, heading, course, nav_status, seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            sighting.name,
            sighting.mmsi,
            sighting.lat,
            sighting.lon,
            sighting.speed,
            sighting.heading,
            sighting.course,
            sighting.nav_status,
            sighting.seen_at,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Returns every sighting in the log, newest `seen_at` first.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn query_all(conn: &Connection) -> Result<Vec<Sighting>, StoreError> {
    let sql = format!("SELECT {SIGHTING_COLUMNS} FROM sightings ORDER BY seen_at DESC, id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], sighting_from_row)?;
    collect(rows)
}

/// Returns the most recent sighting for each distinct vessel name,
/// newest first.
///
/// Relies on SQLite's documented bare-column behavior: with a single
/// `MAX(seen_at)` aggregate, the other selected columns come from the row
/// that holds the maximum.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn query_latest_per_vessel(conn: &Connection) -> Result<Vec<Sighting>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name, mmsi, lat, lon, speed, heading, course, nav_status, MAX(seen_at) as seen_at
         FROM sightings
         GROUP BY name
         ORDER BY seen_at DESC",
    )?;
    let rows = stmt.query_map([], sighting_from_row)?;
    collect(rows)
}

/// Returns one vessel's full trail, oldest `seen_at` first.
///
/// An unknown vessel name yields an empty vector, not an error.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn query_history(conn: &Connection, name: &str) -> Result<Vec<Sighting>, StoreError> {
    let sql = format!(
        "SELECT {SIGHTING_COLUMNS} FROM sightings
         WHERE name = ?1
         ORDER BY seen_at ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![name], sighting_from_row)?;
    collect(rows)
}

/// Aggregate traffic statistics over the sighting log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficStats {
    /// Total number of sightings recorded.
    pub total_sightings: i64,
    /// Number of distinct vessel names seen.
    pub unique_vessels: i64,
    /// The five most-sighted vessels, most active first.
    pub most_active: Vec<VesselActivity>,
}

/// One entry of the most-active-vessels ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselActivity {
    /// Vessel display name.
    pub name: String,
    /// Number of sightings recorded for this vessel.
    pub count: i64,
}

/// Computes [`TrafficStats`] over the whole log.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn query_stats(conn: &Connection) -> Result<TrafficStats, StoreError> {
    let total_sightings: i64 =
        conn.query_row("SELECT COUNT(*) FROM sightings", [], |row| row.get(0))?;

    let unique_vessels: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT name) FROM sightings",
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT name, COUNT(*) as count
         FROM sightings
         GROUP BY name
         ORDER BY count DESC, name ASC
         LIMIT 5",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(VesselActivity {
            name: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut most_active = Vec::new();
    for row in rows {
        most_active.push(row?);
    }

    Ok(TrafficStats {
        total_sightings,
        unique_vessels,
        most_active,
    })
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<Sighting>>,
) -> Result<Vec<Sighting>, StoreError> {
    let mut sightings = Vec::new();
    for row in rows {
        sightings.push(row?);
    }
    Ok(sightings)
}
