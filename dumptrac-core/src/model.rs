//! Domain data structures for bins, reports, and the reconciled dashboard view.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a bin known to the backend.
pub struct BinId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a fullness report.
pub struct ReportId(pub i64);

impl fmt::Display for BinId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A latitude/longitude pair in decimal degrees.
pub struct GeoPoint {
    /// Latitude, -90 to 90.
    pub latitude: f64,
    /// Longitude, -180 to 180.
    pub longitude: f64,
}

impl GeoPoint {
    /// Construct a point from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A physical waste bin, identified by its location string.
pub struct Bin {
    /// Unique identifier assigned by the backend.
    pub id: BinId,
    /// Human-entered location label; the deduplication key.
    pub location: String,
    /// Latitude captured when the bin was first reported.
    #[serde(default, deserialize_with = "deserialize_coordinate")]
    pub latitude: Option<f64>,
    /// Longitude captured when the bin was first reported.
    #[serde(default, deserialize_with = "deserialize_coordinate")]
    pub longitude: Option<f64>,
}

impl Bin {
    /// Map position of the bin when both coordinates are usable numbers.
    #[must_use]
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some(GeoPoint::new(latitude, longitude))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Body of `POST /bins`.
pub struct NewBin {
    /// Location label to upsert by.
    pub location: String,
    /// Latitude, stored only if the bin is created by this call.
    pub latitude: Option<f64>,
    /// Longitude, stored only if the bin is created by this call.
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Lifecycle state of a report. Moves only from `Full` to `Done`.
pub enum ReportStatus {
    /// Bin reported full and not yet emptied.
    Full,
    /// Bin cleared by an operator.
    Done,
}

impl ReportStatus {
    /// Wire and display name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Full => "full",
            ReportStatus::Done => "done",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single fullness observation tied to a bin.
pub struct Report {
    /// Unique identifier assigned by the backend.
    pub id: ReportId,
    /// Bin this report refers to.
    pub bin_id: BinId,
    /// Current lifecycle state.
    pub status: ReportStatus,
    /// When the report was submitted.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// When the report was cleared; present exactly when `status` is `Done`.
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub cleared_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Whether the report has been cleared.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == ReportStatus::Done
    }

    /// Check the status/`cleared_at` pairing and timestamp ordering.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match (self.status, self.cleared_at) {
            (ReportStatus::Full, None) => true,
            (ReportStatus::Done, Some(cleared_at)) => cleared_at >= self.created_at,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Body of `POST /reports`.
pub struct NewReport {
    /// Bin the report is filed against.
    pub bin_id: BinId,
    /// Initial status, always `full` for fresh submissions.
    pub status: ReportStatus,
}

#[derive(Debug, Clone, PartialEq)]
/// A report joined with its bin for one refresh cycle.
pub struct ReconciledEntry {
    /// The report as listed by the backend.
    pub report: Report,
    /// The referenced bin, or `None` when the reference dangles.
    pub bin: Option<Bin>,
}

impl ReconciledEntry {
    /// Map position of the entry, if its bin is known and has coordinates.
    #[must_use]
    pub fn position(&self) -> Option<GeoPoint> {
        self.bin.as_ref().and_then(Bin::position)
    }

    /// Location label of the joined bin.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.bin.as_ref().map(|bin| bin.location.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Ordered result of a refresh, in the report order returned by the backend.
pub struct ReconciledView {
    /// Joined entries.
    pub entries: Vec<ReconciledEntry>,
}

impl ReconciledView {
    /// Whether the view holds no reports.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of reports in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

// Older backends persist coordinates as text, so accept numeric strings too.
// Anything unusable is treated as absent instead of failing the whole payload.
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawCoordinate>::deserialize(deserializer)?;
    let value = match raw {
        Some(RawCoordinate::Number(number)) => Some(number),
        Some(RawCoordinate::Text(text)) => text.trim().parse::<f64>().ok(),
        Some(RawCoordinate::Other(_)) | None => None,
    };
    Ok(value.filter(|number| number.is_finite()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Naive timestamps come from servers that drop the offset; they are UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn bin_accepts_numeric_and_text_coordinates() {
        let bin: Bin = serde_json::from_str(
            r#"{"id": 5, "location": "Gate A", "latitude": "6.5", "longitude": 3.3}"#,
        )
        .expect("bin should decode");

        assert_eq!(bin.id, BinId(5));
        assert_eq!(bin.position(), Some(GeoPoint::new(6.5, 3.3)));
    }

    #[test]
    fn unusable_coordinates_become_absent() {
        let bin: Bin = serde_json::from_str(
            r#"{"id": 1, "location": "Gate B", "latitude": "north", "longitude": null}"#,
        )
        .expect("bin should decode");

        assert_eq!(bin.latitude, None);
        assert_eq!(bin.longitude, None);
        assert_eq!(bin.position(), None);

        let bare: Bin = serde_json::from_str(r#"{"id": 2, "location": "Gate C"}"#)
            .expect("bin without coordinates should decode");
        assert_eq!(bare.position(), None);
    }

    #[test]
    fn report_accepts_naive_and_offset_timestamps() {
        let report: Report = serde_json::from_str(
            r#"{"id": 1, "bin_id": 5, "status": "done",
                "created_at": "2024-03-01T10:00:00.123456",
                "cleared_at": "2024-03-01T12:30:00+01:00"}"#,
        )
        .expect("report should decode");

        assert_eq!(report.status, ReportStatus::Done);
        assert_eq!(
            report.cleared_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).unwrap())
        );
        assert!(report.is_consistent());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let decoded = serde_json::from_str::<Report>(
            r#"{"id": 1, "bin_id": 5, "status": "overflowing", "created_at": "2024-03-01T10:00:00Z"}"#,
        );
        assert!(decoded.is_err(), "only full and done are valid statuses");
    }

    #[test]
    fn consistency_requires_cleared_at_iff_done() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut report = Report {
            id: ReportId(1),
            bin_id: BinId(1),
            status: ReportStatus::Full,
            created_at,
            cleared_at: None,
        };
        assert!(report.is_consistent());

        report.status = ReportStatus::Done;
        assert!(!report.is_consistent());

        report.cleared_at = Some(created_at - chrono::Duration::minutes(1));
        assert!(!report.is_consistent());

        report.cleared_at = Some(created_at);
        assert!(report.is_consistent());
    }
}
