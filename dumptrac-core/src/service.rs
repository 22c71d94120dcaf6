//! High-level service facade: the single dispatch entry point for commands.

use std::sync::Arc;

use crate::backend::Backend;
use crate::command::Command;
use crate::lifecycle::{BatchResult, ReportLifecycle};
use crate::model::{Bin, ReconciledView, Report, ReportId};
use crate::ports::PortError;
use crate::reconcile::DashboardReconciler;
use crate::registry::BinRegistry;

/// What a dispatched command did before the follow-up refresh.
#[derive(Debug)]
pub enum Effect {
    /// A report was filed against a (possibly new) bin.
    Submitted {
        /// Bin the report was filed against.
        bin: Bin,
        /// The new report.
        report: Report,
    },
    /// One report was cleared.
    Cleared(Report),
    /// A batch clear ran; outcomes may be mixed.
    BatchCleared(BatchResult),
    /// Only a refresh was requested.
    Refreshed,
}

/// Result of a dispatched command.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// What the command did.
    pub effect: Effect,
    /// The follow-up refresh, absent when nothing was written.
    pub refresh: Option<Result<ReconciledView, PortError>>,
}

impl DispatchOutcome {
    /// One-line summary for the status bar.
    #[must_use]
    pub fn status_message(&self) -> String {
        let summary = match &self.effect {
            Effect::Submitted { bin, report } => {
                format!("Report {} submitted for {}", report.id, bin.location)
            }
            Effect::Cleared(report) => format!("Report {} cleared", report.id),
            Effect::BatchCleared(batch) if batch.outcomes.is_empty() => {
                "No open reports to clear".to_owned()
            }
            Effect::BatchCleared(batch) if batch.is_complete() => {
                format!("Cleared {} reports", batch.succeeded())
            }
            Effect::BatchCleared(batch) => {
                let failed: Vec<String> = batch
                    .failures()
                    .map(|(id, err)| format!("{id} ({err})"))
                    .collect();
                format!(
                    "Cleared {} of {} reports; failed: {}",
                    batch.succeeded(),
                    batch.outcomes.len(),
                    failed.join(", ")
                )
            }
            Effect::Refreshed => "Dashboard refreshed".to_owned(),
        };

        match &self.refresh {
            Some(Err(err)) => format!("{summary}; refresh failed: {err}"),
            _ => summary,
        }
    }

    /// The refreshed view, if a refresh ran and succeeded.
    #[must_use]
    pub fn view(&self) -> Option<&ReconciledView> {
        self.refresh.as_ref().and_then(|refresh| refresh.as_ref().ok())
    }
}

/// Public entry point wiring the registry, lifecycle, and reconciler to one backend.
pub struct DumptracService {
    name: String,
    registry: BinRegistry,
    lifecycle: ReportLifecycle,
    reconciler: DashboardReconciler,
}

impl DumptracService {
    /// Create a new service bound to the provided backend.
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            registry: BinRegistry::new(Arc::clone(&backend.bins)),
            lifecycle: ReportLifecycle::new(Arc::clone(&backend.reports)),
            reconciler: DashboardReconciler::new(backend.reports, backend.bins),
            name: backend.name,
        }
    }

    /// Name of the backend this service talks to.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        &self.name
    }

    /// Load and join the dashboard data.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if either fetch fails.
    pub async fn refresh(&self) -> Result<ReconciledView, PortError> {
        self.reconciler.refresh().await
    }

    /// Ensure a bin for `location` and file a `full` report against it.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] from the bin upsert or the report creation.
    pub async fn submit_report(
        &self,
        location: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<(Bin, Report), PortError> {
        let bin = self.registry.ensure(location, latitude, longitude).await?;
        let report = self.lifecycle.submit(bin.id).await?;
        Ok((bin, report))
    }

    /// Ids of every report currently `full` on the backend, in backend order.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the report listing fails.
    pub async fn open_report_ids(&self) -> Result<Vec<ReportId>, PortError> {
        self.lifecycle.open_ids().await
    }

    /// Run a command, then refresh once if it wrote anything.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the command's own operation fails. A failed
    /// follow-up refresh is reported inside the [`DispatchOutcome`] instead.
    pub async fn dispatch(&self, command: Command) -> Result<DispatchOutcome, PortError> {
        tracing::debug!(?command, "dispatching command");

        let (effect, wrote) = match command {
            Command::SubmitReport {
                location,
                latitude,
                longitude,
            } => {
                let (bin, report) = self.submit_report(&location, latitude, longitude).await?;
                (Effect::Submitted { bin, report }, true)
            }
            Command::ClearReport { id } => (Effect::Cleared(self.lifecycle.clear(id).await?), true),
            Command::ClearAll => {
                let ids = self.open_report_ids().await?;
                let batch = self.lifecycle.clear_all(&ids).await;
                let wrote = batch.succeeded() > 0;
                (Effect::BatchCleared(batch), wrote)
            }
            Command::Refresh => {
                let view = self.refresh().await?;
                return Ok(DispatchOutcome {
                    effect: Effect::Refreshed,
                    refresh: Some(Ok(view)),
                });
            }
        };

        let refresh = if wrote {
            Some(self.refresh().await)
        } else {
            None
        };

        Ok(DispatchOutcome { effect, refresh })
    }
}
