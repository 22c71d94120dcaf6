//! Projection of the reconciled view onto map markers.

use crate::model::{GeoPoint, ReconciledEntry, ReconciledView, ReportId, ReportStatus};
use crate::table::TimeFormat;

/// Map center used before any configuration is applied.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint::new(6.5244, 3.3792);

/// Zoom level used before any configuration is applied.
pub const DEFAULT_ZOOM: u8 = 11;

/// Tooltip fallback for entries without a usable location.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Visual state of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    /// Bin still waiting to be emptied.
    Full,
    /// Bin has been cleared.
    Done,
}

impl From<ReportStatus> for MarkerState {
    fn from(status: ReportStatus) -> Self {
        match status {
            ReportStatus::Full => MarkerState::Full,
            ReportStatus::Done => MarkerState::Done,
        }
    }
}

/// A single pin on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Report the marker was derived from.
    pub report_id: ReportId,
    /// Where to draw the marker.
    pub position: GeoPoint,
    /// Colour class.
    pub state: MarkerState,
    /// Text shown when the marker is inspected.
    pub tooltip: String,
}

/// A rendering target that can hold a set of markers.
pub trait MapSurface {
    /// Build the surface, centred on `center` at `zoom`.
    fn create(center: GeoPoint, zoom: u8) -> Self
    where
        Self: Sized;

    /// Remove every marker.
    fn clear_markers(&mut self);

    /// Add one marker.
    fn add_marker(&mut self, marker: Marker);
}

/// Owned handle to a lazily created map surface.
///
/// The surface is built on first use and reused for every later projection.
#[derive(Debug)]
pub struct MapView<S> {
    center: GeoPoint,
    zoom: u8,
    surface: Option<S>,
}

impl<S: MapSurface> Default for MapView<S> {
    fn default() -> Self {
        Self::new(DEFAULT_CENTER, DEFAULT_ZOOM)
    }
}

impl<S: MapSurface> MapView<S> {
    /// Create a handle; the surface itself is not built yet.
    #[must_use]
    pub fn new(center: GeoPoint, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            surface: None,
        }
    }

    /// Whether the surface has been built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    /// The surface, if it has been built.
    #[must_use]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// The surface, building it on first access.
    pub fn surface_mut(&mut self) -> &mut S {
        let (center, zoom) = (self.center, self.zoom);
        self.surface.get_or_insert_with(|| S::create(center, zoom))
    }
}

/// Derives one marker per entry that has a located bin.
#[derive(Debug, Clone, Default)]
pub struct MapMarkerProjector {
    time: TimeFormat,
}

impl MapMarkerProjector {
    /// Create a projector formatting tooltip times with `time`.
    #[must_use]
    pub fn new(time: TimeFormat) -> Self {
        Self { time }
    }

    /// Markers for every entry whose bin has both coordinates.
    #[must_use]
    pub fn markers(&self, view: &ReconciledView) -> Vec<Marker> {
        view.entries
            .iter()
            .filter_map(|entry| self.marker(entry))
            .collect()
    }

    /// Replace the surface's markers with those derived from `view`.
    ///
    /// Returns the number of markers placed.
    pub fn project<S: MapSurface>(&self, view: &ReconciledView, map: &mut MapView<S>) -> usize {
        let markers = self.markers(view);
        let placed = markers.len();

        let surface = map.surface_mut();
        surface.clear_markers();
        for marker in markers {
            surface.add_marker(marker);
        }

        tracing::debug!(markers = placed, "map markers replaced");
        placed
    }

    fn marker(&self, entry: &ReconciledEntry) -> Option<Marker> {
        let position = entry.position()?;
        let report = &entry.report;

        let location = entry
            .location()
            .map(str::trim)
            .filter(|location| !location.is_empty())
            .unwrap_or(UNKNOWN_LOCATION);

        let mut tooltip = format!(
            "{location}\nStatus: {}\nReported: {}",
            report.status,
            self.time.format(report.created_at)
        );
        if let (ReportStatus::Done, Some(cleared_at)) = (report.status, report.cleared_at) {
            tooltip.push_str("\nCleared: ");
            tooltip.push_str(&self.time.format(cleared_at));
        }

        Some(Marker {
            report_id: report.id,
            position,
            state: report.status.into(),
            tooltip,
        })
    }
}
