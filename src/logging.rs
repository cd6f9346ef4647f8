//! `tracing` subscriber setup.
//!
//! The library only emits events; the binary decides where they go. CLI
//! subcommands log to stderr, the TUI logs to a file because stderr shares the
//! terminal with the alternate screen.

use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const DEFAULT_FILTER: &str = "warn";

pub enum LogSink {
    Stderr,
    File(PathBuf),
}

/// Default log file for the TUI.
pub fn tui_log_path() -> PathBuf {
    Path::new("debug").join("lms.log")
}

/// Install the global subscriber. Calling this more than once is harmless.
pub fn init(sink: LogSink) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match sink {
        LogSink::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        LogSink::File(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                create_dir_all(dir)
                    .map_err(|e| AppError::new(3, format!("Failed to create log dir '{}': {e}", dir.display())))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| AppError::new(3, format!("Failed to open log file '{}': {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    // An already-installed subscriber is fine (tests, repeated calls).
    if let Err(err) = result {
        tracing::debug!(%err, "keeping existing tracing subscriber");
    }
    Ok(())
}
