//! Joins the report and bin collections into the dashboard view.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Bin, BinId, ReconciledEntry, ReconciledView, Report};
use crate::ports::{BinPort, PortError, ReportPort};

/// Loads reports and bins and joins them into a [`ReconciledView`].
pub struct DashboardReconciler {
    reports: Arc<dyn ReportPort>,
    bins: Arc<dyn BinPort>,
}

impl DashboardReconciler {
    /// Create a reconciler over the given ports.
    #[must_use]
    pub fn new(reports: Arc<dyn ReportPort>, bins: Arc<dyn BinPort>) -> Self {
        Self { reports, bins }
    }

    /// Fetch both collections concurrently and join them.
    ///
    /// Either fetch failing fails the whole refresh; no partial view is produced.
    ///
    /// # Errors
    ///
    /// Returns the [`PortError`] of whichever fetch failed.
    pub async fn refresh(&self) -> Result<ReconciledView, PortError> {
        let (reports, bins) =
            tokio::try_join!(self.reports.list_reports(), self.bins.list_bins()).inspect_err(
                |err| tracing::warn!(error = %err, "dashboard refresh failed"),
            )?;

        let view = reconcile(reports, bins);
        tracing::debug!(entries = view.len(), "dashboard refreshed");
        Ok(view)
    }
}

/// Join reports with their bins, keeping the report order.
///
/// Reports whose bin is missing get `None` instead of failing the join.
#[must_use]
pub fn reconcile(reports: Vec<Report>, bins: Vec<Bin>) -> ReconciledView {
    let bins_by_id: HashMap<BinId, Bin> = bins.into_iter().map(|bin| (bin.id, bin)).collect();

    let entries = reports
        .into_iter()
        .map(|report| {
            let bin = bins_by_id.get(&report.bin_id).cloned();
            if bin.is_none() {
                tracing::warn!(
                    report_id = %report.id,
                    bin_id = %report.bin_id,
                    "report references unknown bin"
                );
            }
            ReconciledEntry { report, bin }
        })
        .collect();

    ReconciledView { entries }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::Barrier;

    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::model::{NewBin, NewReport, ReportId, ReportStatus};

    fn report(id: i64, bin_id: i64) -> Report {
        Report {
            id: ReportId(id),
            bin_id: BinId(bin_id),
            status: ReportStatus::Full,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            cleared_at: None,
        }
    }

    fn bin(id: i64, location: &str) -> Bin {
        Bin {
            id: BinId(id),
            location: location.into(),
            latitude: Some(6.5),
            longitude: Some(3.3),
        }
    }

    struct Unreachable;

    #[async_trait]
    impl BinPort for Unreachable {
        async fn list_bins(&self) -> Result<Vec<Bin>, PortError> {
            Err(PortError::Http {
                status: 503,
                message: "bins unavailable".into(),
            })
        }

        async fn upsert_bin(&self, _new_bin: &NewBin) -> Result<Bin, PortError> {
            Err(PortError::Validation("unused".into()))
        }
    }

    #[async_trait]
    impl ReportPort for Unreachable {
        async fn list_reports(&self) -> Result<Vec<Report>, PortError> {
            Err(PortError::Http {
                status: 503,
                message: "reports unavailable".into(),
            })
        }

        async fn create_report(&self, _new_report: &NewReport) -> Result<Report, PortError> {
            Err(PortError::Validation("unused".into()))
        }

        async fn clear_report(&self, _id: ReportId) -> Result<Report, PortError> {
            Err(PortError::Validation("unused".into()))
        }
    }

    /// Both listings wait on one barrier, so neither returns until the other has started.
    struct Rendezvous {
        barrier: Barrier,
    }

    #[async_trait]
    impl BinPort for Rendezvous {
        async fn list_bins(&self) -> Result<Vec<Bin>, PortError> {
            self.barrier.wait().await;
            Ok(vec![bin(5, "Gate A")])
        }

        async fn upsert_bin(&self, _new_bin: &NewBin) -> Result<Bin, PortError> {
            Err(PortError::Validation("unused".into()))
        }
    }

    #[async_trait]
    impl ReportPort for Rendezvous {
        async fn list_reports(&self) -> Result<Vec<Report>, PortError> {
            self.barrier.wait().await;
            Ok(vec![report(1, 5)])
        }

        async fn create_report(&self, _new_report: &NewReport) -> Result<Report, PortError> {
            Err(PortError::Validation("unused".into()))
        }

        async fn clear_report(&self, _id: ReportId) -> Result<Report, PortError> {
            Err(PortError::Validation("unused".into()))
        }
    }

    #[test]
    fn join_keeps_backend_order() {
        let view = reconcile(
            vec![report(3, 5), report(1, 6), report(2, 5)],
            vec![bin(6, "Gate B"), bin(5, "Gate A")],
        );

        let ids: Vec<i64> = view.entries.iter().map(|entry| entry.report.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        let locations: Vec<Option<&str>> =
            view.entries.iter().map(ReconciledEntry::location).collect();
        assert_eq!(locations, vec![Some("Gate A"), Some("Gate B"), Some("Gate A")]);
    }

    #[test]
    fn dangling_bin_reference_yields_placeholder() {
        let view = reconcile(vec![report(1, 77)], vec![bin(5, "Gate A")]);

        assert_eq!(view.len(), 1);
        assert!(view.entries[0].bin.is_none());
        assert!(view.entries[0].position().is_none());
    }

    #[tokio::test]
    async fn refresh_joins_backend_collections() {
        let backend = Arc::new(InMemoryBackend::with_data(
            vec![bin(5, "Gate A")],
            vec![report(1, 5)],
        ));
        let reconciler = DashboardReconciler::new(backend.clone(), backend);

        let view = reconciler.refresh().await.expect("refresh");

        assert_eq!(view.len(), 1);
        assert_eq!(view.entries[0].location(), Some("Gate A"));
    }

    #[tokio::test]
    async fn refresh_fetches_both_collections_concurrently() {
        let ports = Arc::new(Rendezvous {
            barrier: Barrier::new(2),
        });
        let reconciler = DashboardReconciler::new(Arc::<Rendezvous>::clone(&ports), ports);

        let view = tokio::time::timeout(Duration::from_secs(5), reconciler.refresh())
            .await
            .expect("fetches overlap instead of running one after the other")
            .expect("refresh");

        assert_eq!(view.len(), 1);
        assert_eq!(view.entries[0].location(), Some("Gate A"));
    }

    #[tokio::test]
    async fn refresh_fails_when_bin_fetch_fails() {
        let reports = Arc::new(InMemoryBackend::with_data(Vec::new(), vec![report(1, 5)]));
        let reconciler = DashboardReconciler::new(reports, Arc::new(Unreachable));

        let result = reconciler.refresh().await;

        assert!(matches!(result, Err(PortError::Http { status: 503, .. })));
    }

    #[tokio::test]
    async fn refresh_fails_when_report_fetch_fails() {
        let bins = Arc::new(InMemoryBackend::with_data(vec![bin(5, "Gate A")], Vec::new()));
        let reconciler = DashboardReconciler::new(Arc::new(Unreachable), bins);

        let result = reconciler.refresh().await;

        assert!(result.is_err());
    }
}
