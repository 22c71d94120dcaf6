//! Terminal dashboard for dumptrac: report full bins, then track and clear them on a table and map.

mod app;
mod config;
mod input;
mod logging;
mod map_layer;
mod ui;

use std::{io, path::PathBuf, sync::Arc, time::Duration as StdDuration};

use anyhow::Result;
use chrono::{Local, Offset};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use dumptrac_core::{
    Backend, Command,
    map::{MapMarkerProjector, MapView},
    memory::InMemoryBackend,
    service::DumptracService,
    table::{TableProjector, TimeFormat},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::app::{App, Completion};
use crate::config::Settings;
use crate::input::Action;

#[derive(Debug, Parser)]
#[command(name = "dumptrac", version, about = "Report full waste bins and clear them from a dashboard")]
struct Cli {
    /// Settings file (TOML). Defaults to ./dumptrac.toml when present.
    #[arg(long, env = "DUMPTRAC_CONFIG")]
    config: Option<PathBuf>,

    /// Backend API base URL, overriding the settings file.
    #[arg(long)]
    base_url: Option<String>,

    /// Log level for the dumptrac crates, overriding the settings file.
    #[arg(long)]
    log_level: Option<String>,

    /// Run against an in-memory backend instead of the REST API.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(log_level) = cli.log_level {
        settings.log_level = log_level;
    }
    settings.validate()?;

    let _log_guard = logging::init(&settings)?;

    // HTTP + service setup
    let data_backend = if cli.offline {
        tracing::info!("running against in-memory backend");
        Backend::from_shared("in-memory", Arc::new(InMemoryBackend::new()))
    } else {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(StdDuration::from_secs(settings.timeout_secs))
            .build()?;
        tracing::info!(base_url = %settings.base_url, "using REST backend");
        dumptrac_rest::backend(client, settings.base_url.as_str())
    };
    let service = Arc::new(DumptracService::new(data_backend));

    let time = TimeFormat::new(Local::now().offset().fix(), settings.time_format.as_str());
    let app = App::new(
        service,
        TableProjector::new(time.clone()),
        MapMarkerProjector::new(time),
        MapView::new(settings.map_center(), settings.map_zoom),
    );

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "dashboard exited with error");
    }
    res
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Initial load
    dispatch(&mut app, &tx, Command::Refresh);

    loop {
        drain_completions(&mut app, &mut rx);

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::Dispatch(command) => dispatch(&mut app, &tx, command),
            }
        }

        // Yield so finished dispatches can report back between polls.
        tokio::task::yield_now().await;
    }

    Ok(())
}

/// Run a command on a background task; its result arrives through `tx`.
///
/// Overlapping dispatches are not serialised: whichever finishes last wins.
fn dispatch(app: &mut App, tx: &UnboundedSender<Completion>, command: Command) {
    app.begin(&command);

    let service = Arc::clone(&app.service);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = service.dispatch(command.clone()).await;
        if tx.send(Completion { command, result }).is_err() {
            tracing::debug!("dashboard closed before command finished");
        }
    });
}

fn drain_completions(app: &mut App, rx: &mut UnboundedReceiver<Completion>) {
    while let Ok(completion) = rx.try_recv() {
        app.complete(completion);
    }
}
