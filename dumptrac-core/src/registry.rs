//! Bin identity management keyed by location.

use std::sync::Arc;

use crate::model::{Bin, NewBin};
use crate::ports::{BinPort, PortError};

/// Ensures a bin exists for a location, deduplicating by the exact location string.
pub struct BinRegistry {
    bins: Arc<dyn BinPort>,
}

impl BinRegistry {
    /// Create a registry backed by the given bin port.
    #[must_use]
    pub fn new(bins: Arc<dyn BinPort>) -> Self {
        Self { bins }
    }

    /// Return the bin for `location`, creating it with the given coordinates if needed.
    ///
    /// An existing bin is returned as stored: coordinates passed here are only
    /// used when the bin is created, never to update it.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Validation`] if `location` is empty, or another
    /// [`PortError`] when the backend upsert fails.
    pub async fn ensure(
        &self,
        location: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Bin, PortError> {
        if location.trim().is_empty() {
            return Err(PortError::Validation("Location is required".into()));
        }

        let new_bin = NewBin {
            location: location.to_owned(),
            latitude,
            longitude,
        };
        let bin = self.bins.upsert_bin(&new_bin).await?;

        if bin.location != new_bin.location {
            return Err(PortError::InvalidResponse(format!(
                "asked for bin at {:?}, backend returned bin {} at {:?}",
                new_bin.location, bin.id, bin.location
            )));
        }

        tracing::debug!(bin_id = %bin.id, location = %bin.location, "bin ensured");
        Ok(bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;

    fn registry() -> BinRegistry {
        BinRegistry::new(Arc::new(InMemoryBackend::new()))
    }

    #[tokio::test]
    async fn ensure_is_idempotent_by_location() {
        let registry = registry();

        let first = registry
            .ensure("Gate A", Some(6.5), Some(3.3))
            .await
            .expect("first ensure");
        let second = registry
            .ensure("Gate A", Some(9.9), Some(9.9))
            .await
            .expect("second ensure");

        assert_eq!(first.id, second.id);
        assert_eq!(second.latitude, Some(6.5));
        assert_eq!(second.longitude, Some(3.3));
    }

    #[tokio::test]
    async fn distinct_locations_get_distinct_bins() {
        let registry = registry();

        let gate_a = registry.ensure("Gate A", None, None).await.expect("gate a");
        let gate_b = registry.ensure("Gate B", None, None).await.expect("gate b");

        assert_ne!(gate_a.id, gate_b.id);
    }

    #[tokio::test]
    async fn empty_location_is_rejected() {
        let registry = registry();

        for location in ["", "   "] {
            let result = registry.ensure(location, Some(1.0), Some(1.0)).await;
            assert!(
                matches!(result, Err(PortError::Validation(_))),
                "{location:?} should be rejected"
            );
        }
    }
}
