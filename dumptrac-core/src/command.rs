//! Typed intents produced by the presentation layer.

use crate::model::{GeoPoint, ReportId};
use crate::ports::PortError;

/// An action requested by a user of the dashboard or report form.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Report the bin at `location` as full, creating the bin if needed.
    SubmitReport {
        /// Location label; the bin identity.
        location: String,
        /// Latitude used only if the bin is new.
        latitude: Option<f64>,
        /// Longitude used only if the bin is new.
        longitude: Option<f64>,
    },
    /// Clear one report.
    ClearReport {
        /// Report to clear.
        id: ReportId,
    },
    /// Clear every open report.
    ClearAll,
    /// Reload the dashboard.
    Refresh,
}

impl Command {
    /// Build a [`Command::SubmitReport`] from raw form fields.
    ///
    /// The location is trimmed and required. Coordinates are optional but must
    /// be given together, parse as numbers, and lie within valid ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Validation`] describing the first invalid field.
    pub fn submit_from_input(
        location: &str,
        latitude: &str,
        longitude: &str,
    ) -> Result<Self, PortError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(PortError::Validation("Location is required".into()));
        }

        let latitude = parse_coordinate("Latitude", latitude)?;
        let longitude = parse_coordinate("Longitude", longitude)?;

        match (latitude, longitude) {
            (Some(lat), Some(lng)) => {
                if !GeoPoint::new(lat, lng).is_valid() {
                    return Err(PortError::Validation(format!(
                        "Coordinates out of range: {lat}, {lng}"
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(PortError::Validation(
                    "Latitude and longitude must be given together".into(),
                ));
            }
        }

        Ok(Command::SubmitReport {
            location: location.to_owned(),
            latitude,
            longitude,
        })
    }
}

fn parse_coordinate(field: &str, raw: &str) -> Result<Option<f64>, PortError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(PortError::Validation(format!(
            "{field} must be a number, got {raw:?}"
        ))),
    }
}
