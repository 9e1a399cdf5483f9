//! Tracing subscriber setup.
//!
//! Console output is filtered by `RUST_LOG` (default `info`). With a log
//! directory, two daily-rotated files are written there as well:
//!
//! | File                     | Level       |
//! |--------------------------|-------------|
//! | `error.YYYY-MM-DD.log`   | ERROR       |
//! | `success.YYYY-MM-DD.log` | INFO and up |
//!
//! Each file rolls over at midnight UTC and only the newest
//! [`RETAINED_LOG_FILES`] of each kind are kept.

use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::Path;
use tracing_appender::rolling::{Builder, InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// Days of rotated files kept per log kind.
pub const RETAINED_LOG_FILES: usize = 10;

/// Daily appender writing `{prefix}.{date}.log` inside `dir`.
///
/// # Errors
///
/// Returns the appender's [`InitError`] if the first file cannot be created.
pub fn rolling_appender(
    dir: impl AsRef<Path>,
    prefix: &str,
) -> Result<RollingFileAppender, InitError> {
    Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(RETAINED_LOG_FILES)
        .build(dir)
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the log directory is not writable or a log file
/// cannot be created.
pub fn init(log_dir: Option<&str>) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tfmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339())
        .with_filter(filter);

    let (error_file, success_file) = match log_dir {
        Some(dir) => {
            ensure_writable_dir(dir)?;
            let error_file = tfmt::layer()
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(rolling_appender(dir, "error")?)
                .with_filter(LevelFilter::ERROR);
            let success_file = tfmt::layer()
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(rolling_appender(dir, "success")?)
                .with_filter(LevelFilter::INFO);
            (Some(error_file), Some(success_file))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(error_file)
        .with(success_file)
        .try_init()?;
    Ok(())
}
