//! Raw AIS frame validation and shaping.
//!
//! [`normalize`] is a pure function from one raw aisstream.io text frame
//! to either a [`VesselReport`] or a [`Rejection`]. It does no I/O and
//! holds no state, so it is tested directly against literal payload
//! fixtures below.
//!
//! Rejections are a filtering decision, not an error: unnamed vessels and
//! frames without a position are expected, frequent, and dropped by the
//! pipeline without ceremony.

use serde::Deserialize;

use barents_types::VesselReport;

/// The reserved upstream placeholder for a vessel with no known name.
pub const UNKNOWN_VESSEL_PLACEHOLDER: &str = "Unknown";

/// Why a raw frame was not turned into a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The frame was not the expected JSON shape.
    Unparseable,
    /// The vessel name was empty after trimming, or the placeholder.
    UnnamedVessel,
    /// Latitude or longitude was absent.
    MissingPosition,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Unparseable => "unparseable frame",
            Self::UnnamedVessel => "unnamed vessel",
            Self::MissingPosition => "missing position",
        })
    }
}

/// One pushed frame as aisstream.io encodes it: a metadata block plus a
/// message block wrapping the position report.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "MetaData")]
    metadata: Option<RawMetadata>,
    #[serde(rename = "Message")]
    message: Option<RawMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(rename = "ShipName")]
    ship_name: Option<String>,
    #[serde(rename = "MMSI")]
    mmsi: Option<i64>,
    #[serde(rename = "latitude")]
    latitude: Option<f64>,
    #[serde(rename = "longitude")]
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "PositionReport")]
    position_report: Option<RawPositionReport>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPositionReport {
    #[serde(rename = "Sog")]
    sog: Option<f64>,
    #[serde(rename = "TrueHeading")]
    true_heading: Option<f64>,
    #[serde(rename = "Cog")]
    cog: Option<f64>,
    #[serde(rename = "NavigationalStatus")]
    navigational_status: Option<i64>,
}

/// Validates and shapes one raw frame.
///
/// A frame is accepted when it carries a real vessel name (non-empty
/// after trimming, not the `"Unknown"` placeholder) and a complete
/// position. Coordinates are not range-validated — upstream is trusted
/// for coordinate correctness. Optional motion fields pass through as-is;
/// a missing value stays missing, it is never defaulted to zero.
pub fn normalize(raw: &str) -> Result<VesselReport, Rejection> {
    let frame: RawFrame = serde_json::from_str(raw).map_err(|_| Rejection::Unparseable)?;

    let meta = frame.metadata.unwrap_or_default();

    let name = meta.ship_name.as_deref().unwrap_or("").trim();
    if name.is_empty() || name == UNKNOWN_VESSEL_PLACEHOLDER {
        return Err(Rejection::UnnamedVessel);
    }

    let (Some(lat), Some(lon)) = (meta.latitude, meta.longitude) else {
        return Err(Rejection::MissingPosition);
    };

    let report = frame
        .message
        .and_then(|m| m.position_report)
        .unwrap_or_default();

    Ok(VesselReport {
        name: name.to_string(),
        mmsi: meta.mmsi,
        lat,
        lon,
        speed: report.sog,
        heading: report.true_heading,
        course: report.cog,
        nav_status: report.navigational_status,
    })
}
