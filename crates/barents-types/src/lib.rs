//! Shared domain types for the Barents vessel tracker.
//!
//! This crate provides the types passed between the ingestion pipeline,
//! the sighting store, and the server: a [`VesselReport`] (the validated
//! output of the normalizer, not yet timestamped) and a [`Sighting`] (a
//! report stamped with its acceptance time — the unit of persistence and
//! broadcast).
//!
//! No crate in the workspace depends on anything *except* `barents-types`
//! for cross-cutting type definitions. This keeps the dependency graph
//! clean and prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// A validated vessel position report, as produced by the normalizer.
///
/// Optional fields distinguish "not reported" from a legitimate zero
/// value: a vessel at anchor genuinely reports `speed = 0.0`, while a
/// frame with no speed at all yields `None`. Nothing here is ever
/// defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReport {
    /// Vessel display name, trimmed and non-empty.
    pub name: String,
    /// MMSI — the stable numeric vessel identifier, when transmitted.
    pub mmsi: Option<i64>,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Speed over ground in knots.
    pub speed: Option<f64>,
    /// True heading in degrees (AIS transmits 511 for "not available";
    /// that sentinel is passed through untouched).
    pub heading: Option<f64>,
    /// Course over ground in degrees.
    pub course: Option<f64>,
    /// AIS navigational status code (0 = underway, 1 = at anchor,
    /// 5 = moored, ...). Opaque to this system.
    pub nav_status: Option<i64>,
}

/// One accepted, timestamped observation of a vessel.
///
/// Created exclusively by the ingestion pipeline once a report has passed
/// normalization; immutable afterwards. This is both the row shape of the
/// `sightings` table and the JSON payload pushed to live viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    /// Vessel display name.
    pub name: String,
    /// MMSI, when transmitted.
    pub mmsi: Option<i64>,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Speed over ground in knots.
    pub speed: Option<f64>,
    /// True heading in degrees.
    pub heading: Option<f64>,
    /// Course over ground in degrees.
    pub course: Option<f64>,
    /// AIS navigational status code.
    pub nav_status: Option<i64>,
    /// RFC 3339 UTC timestamp assigned at acceptance.
    pub seen_at: String,
}

impl Sighting {
    /// Stamps a report with its acceptance time, producing a sighting.
    pub fn from_report(report: VesselReport, seen_at: String) -> Self {
        Self {
            name: report.name,
            mmsi: report.mmsi,
            lat: report.lat,
            lon: report.lon,
            speed: report.speed,
            heading: report.heading,
            course: report.course,
            nav_status: report.nav_status,
            seen_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_report_preserves_every_field() {
        let report = VesselReport {
            name: "MS NORDIC".to_string(),
            mmsi: Some(123_456_789),
            lat: 70.1,
            lon: 20.5,
            speed: Some(12.4),
            heading: Some(88.0),
            course: Some(90.0),
            nav_status: Some(0),
        };

        let sighting = Sighting::from_report(report, "2025-06-01T12:00:00Z".to_string());

        assert_eq!(sighting.name, "MS NORDIC");
        assert_eq!(sighting.mmsi, Some(123_456_789));
        assert_eq!(sighting.lat, 70.1);
        assert_eq!(sighting.lon, 20.5);
        assert_eq!(sighting.speed, Some(12.4));
        assert_eq!(sighting.heading, Some(88.0));
        assert_eq!(sighting.course, Some(90.0));
        assert_eq!(sighting.nav_status, Some(0));
        assert_eq!(sighting.seen_at, "2025-06-01T12:00:00Z");
    }

    #[test]
    fn absent_optionals_serialize_as_null_not_zero() {
        let sighting = Sighting {
            name: "FISKEBAS".to_string(),
            mmsi: None,
            lat: 69.0,
            lon: 18.0,
            speed: None,
            heading: None,
            course: None,
            nav_status: None,
            seen_at: "2025-06-01T12:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&sighting).expect("serialization should not fail");
        assert!(json["speed"].is_null(), "missing speed must stay null");
        assert!(json["heading"].is_null(), "missing heading must stay null");
        assert!(json["nav_status"].is_null(), "missing nav_status must stay null");
    }
}
