//! Projection of the reconciled view onto table rows.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::model::{ReconciledEntry, ReconciledView, ReportId, ReportStatus};

/// Text shown in place of data that the join could not supply.
pub const PLACEHOLDER: &str = "-";

/// Message of the row emitted when there are no reports.
pub const NO_DATA: &str = "No reports yet";

/// Default `chrono` format string for timestamps in the table.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Clear button state for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAction {
    /// Report the action applies to.
    pub report_id: ReportId,
    /// Whether the report can still be cleared.
    pub enabled: bool,
}

/// One table line describing a report and its bin.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Report id.
    pub report_id: String,
    /// Referenced bin id.
    pub bin_id: String,
    /// Bin location, or [`PLACEHOLDER`].
    pub location: String,
    /// Bin latitude, or [`PLACEHOLDER`].
    pub latitude: String,
    /// Bin longitude, or [`PLACEHOLDER`].
    pub longitude: String,
    /// Report status.
    pub status: ReportStatus,
    /// Formatted submission time.
    pub created: String,
    /// Formatted clear time, empty while the report is open.
    pub cleared: String,
    /// Clear affordance.
    pub action: RowAction,
}

impl ReportRow {
    /// Cell texts in column order, without the action column.
    #[must_use]
    pub fn cells(&self) -> [&str; 8] {
        [
            &self.report_id,
            &self.bin_id,
            &self.location,
            &self.latitude,
            &self.longitude,
            self.status.as_str(),
            &self.created,
            &self.cleared,
        ]
    }
}

/// A projected table line.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    /// A report line.
    Report(ReportRow),
    /// The single line shown for an empty view.
    NoData,
}

/// Column headings matching [`ReportRow::cells`].
pub const COLUMNS: [&str; 8] = [
    "Report",
    "Bin",
    "Location",
    "Latitude",
    "Longitude",
    "Status",
    "Reported",
    "Cleared",
];

/// Renders timestamps in a fixed offset with a `chrono` format string.
#[derive(Debug, Clone)]
pub struct TimeFormat {
    offset: FixedOffset,
    pattern: String,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self::new(Utc.fix(), DEFAULT_TIME_FORMAT)
    }
}

impl TimeFormat {
    /// Render times shifted to `offset` using `pattern`.
    #[must_use]
    pub fn new(offset: FixedOffset, pattern: impl Into<String>) -> Self {
        Self {
            offset,
            pattern: pattern.into(),
        }
    }

    /// Format a timestamp.
    #[must_use]
    pub fn format(&self, timestamp: DateTime<Utc>) -> String {
        timestamp
            .with_timezone(&self.offset)
            .format(&self.pattern)
            .to_string()
    }
}

/// Maps reconciled entries to table rows.
#[derive(Debug, Clone, Default)]
pub struct TableProjector {
    time: TimeFormat,
}

impl TableProjector {
    /// Create a projector rendering times with `time`.
    #[must_use]
    pub fn new(time: TimeFormat) -> Self {
        Self { time }
    }

    /// Project the whole view. An empty view yields a single [`TableRow::NoData`].
    #[must_use]
    pub fn project(&self, view: &ReconciledView) -> Vec<TableRow> {
        if view.is_empty() {
            return vec![TableRow::NoData];
        }

        view.entries
            .iter()
            .map(|entry| TableRow::Report(self.row(entry)))
            .collect()
    }

    /// Project a single entry.
    #[must_use]
    pub fn row(&self, entry: &ReconciledEntry) -> ReportRow {
        let report = &entry.report;
        let bin = entry.bin.as_ref();

        ReportRow {
            report_id: report.id.to_string(),
            bin_id: report.bin_id.to_string(),
            location: bin.map_or_else(|| PLACEHOLDER.to_owned(), |bin| bin.location.clone()),
            latitude: coordinate_cell(bin.and_then(|bin| bin.latitude)),
            longitude: coordinate_cell(bin.and_then(|bin| bin.longitude)),
            status: report.status,
            created: self.time.format(report.created_at),
            cleared: report
                .cleared_at
                .map(|cleared_at| self.time.format(cleared_at))
                .unwrap_or_default(),
            action: RowAction {
                report_id: report.id,
                enabled: report.status != ReportStatus::Done,
            },
        }
    }
}

/// Whether `time_format` is a `chrono` format string that can be rendered.
#[must_use]
pub fn is_valid_time_format(time_format: &str) -> bool {
    !StrftimeItems::new(time_format).any(|item| matches!(item, Item::Error))
}

fn coordinate_cell(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_owned(), |number| number.to_string())
}
