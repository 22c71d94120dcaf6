//! File logging; the terminal itself belongs to the dashboard.

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

const CRATES: [&str; 3] = ["dumptrac", "dumptrac_core", "dumptrac_rest"];

/// Install the global subscriber writing to a daily-rolling file in `log_dir`.
///
/// `RUST_LOG` overrides the configured level. Keep the returned guard alive
/// until shutdown so buffered lines are flushed.
pub(crate) fn init(settings: &Settings) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.log_dir).with_context(|| {
        format!("failed to create log directory {}", settings.log_dir.display())
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&settings.log_level)))
        .with_context(|| format!("invalid log level {:?}", settings.log_level))?;

    let appender = tracing_appender::rolling::daily(&settings.log_dir, "dumptrac.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}

fn default_directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(
            default_directives("debug"),
            "dumptrac=debug,dumptrac_core=debug,dumptrac_rest=debug"
        );
    }
}
