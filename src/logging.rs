//! Diagnostic logging setup
//!
//! Logs go to stdout and, when enabled, are appended to
//! `~/.callpilot/logs/callpilot.log`. `RUST_LOG` overrides the configured level.

use crate::config::{self, LoggingConfig};
use tracing_subscriber::prelude::*;

/// Log file name inside the log directory
const LOG_FILE_NAME: &str = "callpilot.log";

/// Format timestamps using the system's local time via chrono
struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

fn env_filter(settings: &LoggingConfig) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(&settings.level).unwrap_or_else(|e| {
            eprintln!("Invalid log level {:?} ({}), using info", settings.level, e);
            tracing_subscriber::EnvFilter::new("info")
        })
    })
}

fn open_log_file() -> Option<std::fs::File> {
    let log_dir = config::get_log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {:?}: {}", log_dir, e);
        return None;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))
        .map_err(|e| eprintln!("Failed to open log file: {}", e))
        .ok()
}

/// Install the global tracing subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_logging(settings: &LoggingConfig) {
    let stdout_layer = tracing_subscriber::fmt::layer().with_timer(LocalTimer);

    let file_layer = if settings.log_to_file {
        open_log_file().map(|file| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_timer(LocalTimer)
                .with_ansi(false)
        })
    } else {
        None
    };

    let result = tracing_subscriber::registry()
        .with(env_filter(settings))
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
