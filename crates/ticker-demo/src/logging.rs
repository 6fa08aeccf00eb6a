#![forbid(unsafe_code)]

//! Tracing subscriber setup for the demo binary.
//!
//! The filter comes from `TICKER_LOG` (default `info`). Records go to the log
//! file when one is given, otherwise to stderr in headless mode. Interactive
//! mode without a log file installs nothing; the terminal belongs to the
//! frame.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ticker_runtime::OutputMode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "TICKER_LOG";

const DEFAULT_FILTER: &str = "info";

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
    Disabled,
}

impl LogTarget {
    /// Pick a target from the CLI log file and the output mode.
    #[must_use]
    pub fn resolve(log_file: Option<&str>, mode: OutputMode) -> Self {
        match (log_file, mode) {
            (Some(path), _) => Self::File(PathBuf::from(path)),
            (None, OutputMode::Headless) => Self::Stderr,
            (None, OutputMode::Interactive) => Self::Disabled,
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber for `target`.
///
/// Returns `Ok(false)` when nothing was installed, either because logging is
/// disabled or because a subscriber already exists.
pub fn init_tracing(target: &LogTarget) -> io::Result<bool> {
    let installed = match target {
        LogTarget::Disabled => return Ok(false),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(io::stderr)
            .with_target(true)
            .try_init()
            .is_ok(),
        LogTarget::File(path) => {
            let file = open_log(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_thread_names(true)
                .try_init()
                .is_ok()
        }
    };
    Ok(installed)
}
