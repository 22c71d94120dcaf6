//! Report creation and the `full → done` transition.

use std::sync::Arc;

use crate::model::{BinId, NewReport, Report, ReportId, ReportStatus};
use crate::ports::{PortError, ReportPort};

/// Outcome of clearing one report inside a batch.
#[derive(Debug)]
pub struct ClearOutcome {
    /// Report the clear was attempted for.
    pub id: ReportId,
    /// Cleared report, or the reason the clear failed.
    pub result: Result<Report, PortError>,
}

/// Per-report outcomes of a batch clear, in the order the ids were given.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// One entry per requested id.
    pub outcomes: Vec<ClearOutcome>,
}

impl BatchResult {
    /// Number of reports that were cleared.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count()
    }

    /// Number of reports whose clear failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Failed ids together with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (ReportId, &PortError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|err| (outcome.id, err)))
    }

    /// Whether every clear in the batch succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

/// Creates reports and moves them from `full` to `done`.
///
/// Clearing a report that is already `done` is a no-op: the report is
/// returned as stored and keeps its original `cleared_at`.
pub struct ReportLifecycle {
    reports: Arc<dyn ReportPort>,
}

impl ReportLifecycle {
    /// Create a lifecycle bound to the given report port.
    #[must_use]
    pub fn new(reports: Arc<dyn ReportPort>) -> Self {
        Self { reports }
    }

    /// File a fresh `full` report against `bin_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NotFound`] if the bin does not resolve,
    /// [`PortError::InvalidResponse`] if the backend returns something other
    /// than an open report, or another [`PortError`] when the request fails.
    pub async fn submit(&self, bin_id: BinId) -> Result<Report, PortError> {
        let new_report = NewReport {
            bin_id,
            status: ReportStatus::Full,
        };
        let report = self.reports.create_report(&new_report).await?;

        if report.status != ReportStatus::Full || report.cleared_at.is_some() {
            return Err(PortError::InvalidResponse(format!(
                "new report {} came back as {} instead of open",
                report.id, report.status
            )));
        }

        tracing::info!(report_id = %report.id, bin_id = %bin_id, "report submitted");
        Ok(report)
    }

    /// Ids of every report still `full`, in backend order.
    ///
    /// Only the report listing is consulted, so a bin outage does not block clearing.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the report listing fails.
    pub async fn open_ids(&self) -> Result<Vec<ReportId>, PortError> {
        let reports = self.reports.list_reports().await?;
        Ok(reports
            .into_iter()
            .filter(|report| report.status == ReportStatus::Full)
            .map(|report| report.id)
            .collect())
    }

    /// Transition a report to `done`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NotFound`] if the report is unknown,
    /// [`PortError::InvalidResponse`] if the backend returns a report that is
    /// not consistently cleared, or another [`PortError`] when the request fails.
    pub async fn clear(&self, id: ReportId) -> Result<Report, PortError> {
        let report = self.reports.clear_report(id).await?;

        if report.id != id || !report.is_done() || !report.is_consistent() {
            return Err(PortError::InvalidResponse(format!(
                "clearing report {id} returned report {} with status {} and cleared_at {:?}",
                report.id, report.status, report.cleared_at
            )));
        }

        tracing::info!(report_id = %id, "report cleared");
        Ok(report)
    }

    /// Clear each report in turn, waiting for one before starting the next.
    ///
    /// A failed clear neither stops the batch nor undoes earlier clears.
    pub async fn clear_all(&self, ids: &[ReportId]) -> BatchResult {
        let mut outcomes = Vec::with_capacity(ids.len());

        for &id in ids {
            let result = self.clear(id).await;
            if let Err(err) = &result {
                tracing::warn!(report_id = %id, error = %err, "clear failed in batch");
            }
            outcomes.push(ClearOutcome { id, result });
        }

        let batch = BatchResult { outcomes };
        tracing::info!(
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            "batch clear finished"
        );
        batch
    }
}
