use dumptrac_core::{
    GeoPoint, ReportId,
    map::{MapSurface, Marker},
};

/// Highest zoom level the layer accepts, matching common slippy-map tiles.
pub(crate) const MAX_ZOOM: u8 = 19;

/// Marker layer drawn on the dashboard's canvas.
#[derive(Debug)]
pub(crate) struct MarkerLayer {
    pub center: GeoPoint,
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl MapSurface for MarkerLayer {
    fn create(center: GeoPoint, zoom: u8) -> Self {
        tracing::debug!(lat = center.latitude, lng = center.longitude, zoom, "map created");
        Self {
            center,
            zoom: zoom.min(MAX_ZOOM),
            markers: Vec::new(),
        }
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }
}

impl MarkerLayer {
    /// Longitude and latitude bounds of the visible area.
    pub(crate) fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let half_width = 180.0 / f64::from(1_u32 << self.zoom);
        let half_height = half_width / 2.0;

        let x_bounds = [
            (self.center.longitude - half_width).max(-180.0),
            (self.center.longitude + half_width).min(180.0),
        ];
        let y_bounds = [
            (self.center.latitude - half_height).max(-90.0),
            (self.center.latitude + half_height).min(90.0),
        ];
        (x_bounds, y_bounds)
    }

    pub(crate) fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub(crate) fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1);
    }

    /// Re-centre on a report's marker, if it has one.
    pub(crate) fn focus(&mut self, report_id: ReportId) -> Option<&Marker> {
        let marker = self
            .markers
            .iter()
            .find(|marker| marker.report_id == report_id)?;
        self.center = marker.position;
        Some(marker)
    }
}
