use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{runtime_dir, LogLevel};

const LOG_PREFIX: &str = "battwise";
const MAX_LOG_FILES: usize = 7;
const QUIET_TARGETS: [&str; 3] = ["ureq=warn", "rustls=warn", "rusqlite=warn"];

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Daily rolling file in the runtime dir.
    File,
    Stderr,
    Both,
}

impl LogMode {
    fn writes_file(self) -> bool {
        matches!(self, LogMode::File | LogMode::Both)
    }

    fn writes_stderr(self) -> bool {
        matches!(self, LogMode::Stderr | LogMode::Both)
    }
}

/// Keeps the non-blocking file writer alive. Drop it last.
#[derive(Default)]
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// A `--log-level` from the command line wins over the config. When the log
/// file cannot be opened, file output falls back to stderr.
pub fn init(level: LogLevel, mode: LogMode, cli_override: Option<LogLevel>) -> LogGuard {
    let Some(level) = cli_override.unwrap_or(level).as_tracing_level() else {
        return LogGuard::default();
    };

    let file = if mode.writes_file() {
        file_writer()
    } else {
        None
    };
    let to_stderr = mode.writes_stderr() || (mode.writes_file() && file.is_none());

    let (file_layer, guard) = match file {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(UtcTime::rfc_3339())
            .with_ansi(true)
            .with_target(true)
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    if let Err(e) = installed {
        eprintln!("Warning: logging already initialised: {}", e);
    }

    LogGuard { _guard: guard }
}

/// `RUST_LOG` refines the default level; noisy dependencies stay at warn.
fn env_filter(level: Level) -> EnvFilter {
    QUIET_TARGETS
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
            |filter, directive| filter.add_directive(directive),
        )
}

fn file_writer() -> Option<(NonBlocking, WorkerGuard)> {
    let dir = log_dir();

    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Warning: cannot create log directory {}: {}", dir.display(), e);
        return None;
    }

    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&dir)
    {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(e) => {
            eprintln!("Warning: cannot open log file in {}: {}", dir.display(), e);
            None
        }
    }
}

pub fn log_dir() -> PathBuf {
    runtime_dir()
}
