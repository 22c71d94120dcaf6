use dumptrac_core::{
    ReportStatus,
    map::MarkerState,
    table::{COLUMNS, NO_DATA, TableRow},
};
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap,
        canvas::{Canvas, Map, MapResolution},
    },
};

use crate::app::{App, FormField, Screen, TableContent};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new(format!(
        "dumptrac – full bin reports · backend {}",
        app.service.backend_name()
    ))
    .block(Block::default().borders(Borders::ALL).title("dumptrac"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::Dashboard => draw_dashboard(frame, app, *content_area),
        Screen::ReportForm => draw_report_form(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::Dashboard => {
            "↑/↓ select · c/Enter clear · a clear all · r refresh · f focus map · +/- zoom · n report · q quit"
        }
        Screen::ReportForm => "Type to edit · Tab/↑/↓ switch field · Enter submit · Esc back · Ctrl-C quit",
    };

    let status_text = match (&app.status, app.is_loading()) {
        (Some(status), _) => format!("{} · {nav_hint}", status.text),
        (None, true) => format!("Loading… · {nav_hint}"),
        (None, false) => nav_hint.to_owned(),
    };

    let status_style = match &app.status {
        Some(status) if status.is_error => Style::default().fg(Color::Red),
        Some(_) => Style::default().fg(Color::Green),
        None if app.is_loading() => Style::default().fg(Color::Yellow),
        None => Style::default(),
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_dashboard(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let [table_area, side_area] = columns.as_ref() else {
        return;
    };

    draw_reports_table(frame, app, *table_area);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(*side_area);

    let [map_area, tooltip_area] = side.as_ref() else {
        return;
    };

    draw_map(frame, app, *map_area);

    let tooltip = app
        .selected_tooltip()
        .unwrap_or("Select a report with a map position to see details.");
    let details = Paragraph::new(tooltip)
        .block(Block::default().borders(Borders::ALL).title("Marker"))
        .wrap(Wrap { trim: true });
    frame.render_widget(details, *tooltip_area);
}

fn draw_reports_table(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Reports");

    let message = match &app.table {
        TableContent::Loading => Some(("Loading…".to_owned(), Style::default().fg(Color::Yellow))),
        TableContent::Error(err) => Some((format!("Error: {err}"), Style::default().fg(Color::Red))),
        TableContent::Rows(_) => None,
    };

    let rows: Vec<Row<'_>> = match &app.table {
        TableContent::Rows(rows) => rows.iter().map(table_row).collect(),
        TableContent::Loading | TableContent::Error(_) => Vec::new(),
    };

    let rows = match message {
        Some((text, style)) => vec![Row::new(vec![Cell::from(text)]).style(style)],
        None => rows,
    };

    let column_widths = [
        Constraint::Length(7),
        Constraint::Length(5),
        Constraint::Min(12),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(7),
    ];

    let mut header_cells: Vec<&str> = COLUMNS.to_vec();
    header_cells.push("Action");

    let table = Table::new(rows, column_widths)
        .header(Row::new(header_cells).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if app.row_count() > 0 {
        state.select(Some(app.table_index));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn table_row(row: &TableRow) -> Row<'_> {
    match row {
        TableRow::NoData => Row::new(vec![Cell::from(NO_DATA)]),
        TableRow::Report(report) => {
            let mut cells: Vec<Cell<'_>> = report.cells().into_iter().map(Cell::from).collect();
            let action = if report.action.enabled {
                Cell::from("[clear]")
            } else {
                Cell::from("").style(Style::default().add_modifier(Modifier::DIM))
            };
            cells.push(action);
            Row::new(cells).style(Style::default().fg(status_color(report.status)))
        }
    }
}

fn draw_map(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    let Some(layer) = app.map.surface() else {
        let paragraph = Paragraph::new("Map appears after the first refresh.")
            .block(block.title("Map"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let (x_bounds, y_bounds) = layer.bounds();
    let title = format!(
        "Map · {:.4}, {:.4} · zoom {} · {} markers",
        layer.center.latitude,
        layer.center.longitude,
        layer.zoom,
        layer.markers.len()
    );

    let canvas = Canvas::default()
        .block(block.title(title))
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: Color::DarkGray,
            });
            ctx.layer();
            for marker in &layer.markers {
                let color = match marker.state {
                    MarkerState::Full => Color::Red,
                    MarkerState::Done => Color::Green,
                };
                ctx.print(
                    marker.position.longitude,
                    marker.position.latitude,
                    Span::styled("●", Style::default().fg(color)),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_report_form(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // location
            Constraint::Length(3), // latitude
            Constraint::Length(3), // longitude
            Constraint::Min(0),    // help
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [location_area, latitude_area, longitude_area, help_area] = chunks else {
        return;
    };

    let focused = app.form.focused();
    let fields = [
        (FormField::Location, "Location (required)", &app.form.location, location_area),
        (FormField::Latitude, "Latitude (optional)", &app.form.latitude, latitude_area),
        (FormField::Longitude, "Longitude (optional)", &app.form.longitude, longitude_area),
    ];

    for (field, title, value, field_area) in fields {
        let style = if field == focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let input = Paragraph::new(value.as_str())
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(style);
        frame.render_widget(input, *field_area);
    }

    let help = Paragraph::new(
        "Name the bin's location exactly as before to add a report to an existing bin. \
         Coordinates are kept from the first report of a location.",
    )
    .block(Block::default().borders(Borders::ALL).title("Report a full bin"))
    .wrap(Wrap { trim: true });
    frame.render_widget(help, *help_area);
}

fn status_color(status: ReportStatus) -> Color {
    match status {
        ReportStatus::Full => Color::Red,
        ReportStatus::Done => Color::Green,
    }
}
