//! Bundle of ports making up one backend connection.

use std::sync::Arc;

use crate::ports::{BinPort, ReportPort};

/// Collection of ports implementing a single backend.
#[derive(Clone)]
pub struct Backend {
    /// Short human-readable name, shown in the dashboard header.
    pub name: String,
    /// Implementation for bin listing and upserts.
    pub bins: Arc<dyn BinPort>,
    /// Implementation for report listing and lifecycle writes.
    pub reports: Arc<dyn ReportPort>,
}

impl Backend {
    /// Build a backend from a single value implementing both ports.
    #[must_use]
    pub fn from_shared<T>(name: impl Into<String>, shared: Arc<T>) -> Self
    where
        T: BinPort + ReportPort + 'static,
    {
        let bins: Arc<dyn BinPort> = Arc::<T>::clone(&shared);
        let reports: Arc<dyn ReportPort> = shared;
        Self {
            name: name.into(),
            bins,
            reports,
        }
    }
}
