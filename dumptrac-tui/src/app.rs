use std::sync::Arc;

use dumptrac_core::{
    Command, DispatchOutcome, Effect, PortError, ReconciledView,
    map::{MapMarkerProjector, MapView, Marker},
    service::DumptracService,
    table::{TableProjector, TableRow},
};

use crate::map_layer::MarkerLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    ReportForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormField {
    Location,
    Latitude,
    Longitude,
}

impl FormField {
    pub(crate) fn next(self) -> Self {
        match self {
            FormField::Location => FormField::Latitude,
            FormField::Latitude => FormField::Longitude,
            FormField::Longitude => FormField::Location,
        }
    }

    pub(crate) fn previous(self) -> Self {
        match self {
            FormField::Location => FormField::Longitude,
            FormField::Latitude => FormField::Location,
            FormField::Longitude => FormField::Latitude,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ReportForm {
    pub location: String,
    pub latitude: String,
    pub longitude: String,
    pub focus: Option<FormField>,
}

impl ReportForm {
    pub(crate) fn focused(&self) -> FormField {
        self.focus.unwrap_or(FormField::Location)
    }

    pub(crate) fn field_mut(&mut self) -> &mut String {
        match self.focused() {
            FormField::Location => &mut self.location,
            FormField::Latitude => &mut self.latitude,
            FormField::Longitude => &mut self.longitude,
        }
    }

    pub(crate) fn to_command(&self) -> Result<Command, PortError> {
        Command::submit_from_input(&self.location, &self.latitude, &self.longitude)
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What the report table currently shows.
#[derive(Debug)]
pub(crate) enum TableContent {
    Loading,
    Rows(Vec<TableRow>),
    Error(String),
}

/// A finished dispatch, sent back from the task that ran it.
#[derive(Debug)]
pub(crate) struct Completion {
    pub command: Command,
    pub result: Result<DispatchOutcome, PortError>,
}

#[derive(Debug, Clone)]
pub(crate) struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

pub(crate) struct App {
    pub service: Arc<DumptracService>,

    pub screen: Screen,
    pub table: TableContent,
    pub table_index: usize,
    pub map: MapView<MarkerLayer>,
    pub form: ReportForm,

    pub table_projector: TableProjector,
    pub map_projector: MapMarkerProjector,

    pub in_flight: usize,
    pub status: Option<StatusLine>,
}

impl App {
    pub(crate) fn new(
        service: Arc<DumptracService>,
        table_projector: TableProjector,
        map_projector: MapMarkerProjector,
        map: MapView<MarkerLayer>,
    ) -> Self {
        Self {
            service,
            screen: Screen::Dashboard,
            table: TableContent::Loading,
            table_index: 0,
            map,
            form: ReportForm::default(),
            table_projector,
            map_projector,
            in_flight: 0,
            status: None,
        }
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error,
        });
    }

    /// Bookkeeping before a command is handed to a background task.
    pub(crate) fn begin(&mut self, command: &Command) {
        self.in_flight += 1;
        if matches!(command, Command::Refresh) {
            self.table = TableContent::Loading;
        }
        self.status = None;
    }

    /// Apply a finished dispatch. Completions are applied in arrival order,
    /// so the last refresh to resolve determines what is shown.
    pub(crate) fn complete(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion.result {
            Ok(outcome) => {
                self.set_status(outcome.status_message(), !outcome_is_clean(&outcome));
                if matches!(outcome.effect, Effect::Submitted { .. }) {
                    self.form.reset();
                }
                match &outcome.refresh {
                    Some(Ok(view)) => self.show(view),
                    Some(Err(err)) => self.table = TableContent::Error(err.to_string()),
                    None => {}
                }
            }
            Err(err) => {
                tracing::warn!(command = ?completion.command, error = %err, "command failed");
                if matches!(completion.command, Command::Refresh) {
                    // Markers from the last good refresh stay on the map.
                    self.table = TableContent::Error(err.to_string());
                }
                self.set_status(format!("Error: {err}"), true);
            }
        }
    }

    /// Project a fresh view onto the table and the map.
    pub(crate) fn show(&mut self, view: &ReconciledView) {
        let rows = self.table_projector.project(view);
        self.table_index = self.table_index.min(rows.len().saturating_sub(1));
        self.table = TableContent::Rows(rows);
        self.map_projector.project(view, &mut self.map);
    }

    pub(crate) fn row_count(&self) -> usize {
        match &self.table {
            TableContent::Rows(rows) => rows.len(),
            TableContent::Loading | TableContent::Error(_) => 0,
        }
    }

    pub(crate) fn select_previous(&mut self) {
        self.table_index = self.table_index.saturating_sub(1);
    }

    pub(crate) fn select_next(&mut self) {
        if self.table_index + 1 < self.row_count() {
            self.table_index += 1;
        }
    }

    pub(crate) fn selected_row(&self) -> Option<&TableRow> {
        match &self.table {
            TableContent::Rows(rows) => rows.get(self.table_index),
            TableContent::Loading | TableContent::Error(_) => None,
        }
    }

    /// Command clearing the selected report, if its clear action is enabled.
    pub(crate) fn clear_selected(&mut self) -> Option<Command> {
        let Some(TableRow::Report(row)) = self.selected_row() else {
            self.set_status("Select a report to clear", true);
            return None;
        };
        let action = row.action;
        if !action.enabled {
            self.set_status(format!("Report {} is already cleared", action.report_id), true);
            return None;
        }
        Some(Command::ClearReport {
            id: action.report_id,
        })
    }

    /// Marker of the selected report, re-centring the map on it.
    pub(crate) fn focus_selected(&mut self) -> Option<&Marker> {
        let report_id = match self.selected_row() {
            Some(TableRow::Report(row)) => row.action.report_id,
            _ => return None,
        };
        self.map.surface_mut().focus(report_id)
    }

    pub(crate) fn selected_tooltip(&self) -> Option<&str> {
        let Some(TableRow::Report(row)) = self.selected_row() else {
            return None;
        };
        self.map
            .surface()?
            .markers
            .iter()
            .find(|marker| marker.report_id == row.action.report_id)
            .map(|marker| marker.tooltip.as_str())
    }
}

fn outcome_is_clean(outcome: &DispatchOutcome) -> bool {
    let batch_ok = match &outcome.effect {
        Effect::BatchCleared(batch) => batch.is_complete(),
        _ => true,
    };
    batch_ok && !matches!(outcome.refresh, Some(Err(_)))
}
