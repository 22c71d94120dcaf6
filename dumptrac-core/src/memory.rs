//! In-process backend holding bins and reports in memory.
//!
//! Used for offline runs of the dashboard and as the collaborator in tests.
//! It applies the same persistence rules the REST backend does: bins are
//! upserted by exact location, reports start `full` and only ever move to
//! `done`, and unknown ids resolve to [`PortError::NotFound`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::model::{Bin, BinId, NewBin, NewReport, Report, ReportId, ReportStatus};
use crate::ports::{BinPort, PortError, ReportPort};

#[derive(Debug, Default)]
struct Store {
    bins: Vec<Bin>,
    reports: Vec<Report>,
}

/// Backend keeping all data in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with bins and reports, kept in the given order.
    #[must_use]
    pub fn with_data(bins: Vec<Bin>, reports: Vec<Report>) -> Self {
        Self {
            store: Mutex::new(Store { bins, reports }),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // The store holds plain data, so a panic elsewhere cannot leave it half-written.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> Result<i64, PortError> {
    ids.max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| PortError::Validation("no ids left to assign".into()))
}

#[async_trait]
impl BinPort for InMemoryBackend {
    async fn list_bins(&self) -> Result<Vec<Bin>, PortError> {
        Ok(self.store().bins.clone())
    }

    async fn upsert_bin(&self, new_bin: &NewBin) -> Result<Bin, PortError> {
        let mut store = self.store();

        if let Some(existing) = store
            .bins
            .iter()
            .find(|bin| bin.location == new_bin.location)
        {
            return Ok(existing.clone());
        }

        let bin = Bin {
            id: BinId(next_id(store.bins.iter().map(|bin| bin.id.0))?),
            location: new_bin.location.clone(),
            latitude: new_bin.latitude,
            longitude: new_bin.longitude,
        };
        store.bins.push(bin.clone());
        Ok(bin)
    }
}

#[async_trait]
impl ReportPort for InMemoryBackend {
    async fn list_reports(&self) -> Result<Vec<Report>, PortError> {
        Ok(self.store().reports.clone())
    }

    async fn create_report(&self, new_report: &NewReport) -> Result<Report, PortError> {
        let mut store = self.store();

        if !store.bins.iter().any(|bin| bin.id == new_report.bin_id) {
            return Err(PortError::NotFound(format!(
                "bin {} does not exist",
                new_report.bin_id
            )));
        }

        let report = Report {
            id: ReportId(next_id(store.reports.iter().map(|report| report.id.0))?),
            bin_id: new_report.bin_id,
            status: new_report.status,
            created_at: Utc::now(),
            cleared_at: (new_report.status == ReportStatus::Done).then(Utc::now),
        };
        store.reports.push(report.clone());
        Ok(report)
    }

    async fn clear_report(&self, id: ReportId) -> Result<Report, PortError> {
        let mut store = self.store();

        let report = store
            .reports
            .iter_mut()
            .find(|report| report.id == id)
            .ok_or_else(|| PortError::NotFound(format!("report {id} does not exist")))?;

        // Clearing twice keeps the first clear time.
        if report.status != ReportStatus::Done {
            let now = Utc::now().max(report.created_at);
            report.status = ReportStatus::Done;
            report.cleared_at = Some(now);
        }

        Ok(report.clone())
    }
}
