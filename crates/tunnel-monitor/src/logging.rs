//! Logging setup.

use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Diagnostics file written while the dashboard owns the terminal.
pub const LOG_FILE_NAME: &str = "tunnelflare.log";

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Setup logging to stderr with the given level.
pub fn setup_logging(level: &str, json: bool) {
    if json {
        tracing_subscriber::registry()
            .with(filter(level))
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter(level))
            .with(fmt::layer().pretty().with_writer(io::stderr))
            .init();
    }
}

/// Setup logging to `<dir>/tunnelflare.log`.
///
/// Keep the guard alive until exit or buffered lines are lost.
pub fn setup_file_logging(level: &str, dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Ok(guard)
}
