//! Diagnostics sink: daily rotated log files plus stderr.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "rfid_forwarder=info";
const VERBOSE_LOG_FILTER: &str = "rfid_forwarder=debug";

/// Base name of the log files; the appender adds the date.
const LOG_FILE_PREFIX: &str = "rfid_reader";

/// Days of logs kept on disk.
const MAX_LOG_FILES: usize = 7;

/// Install the global subscriber.
///
/// Logs go to stderr and, when `log_dir` is usable, to a daily rotated file
/// in it. The returned guard flushes the file writer on drop and must be held
/// until the process exits. `RUST_LOG` overrides the default filter.
pub fn init(log_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = match daily_appender(log_dir) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter.clone());
            (Some(layer), Some(guard))
        }
        Err(err) => {
            eprintln!(
                "Warning: logging to stderr only, cannot use {}: {}",
                log_dir.display(),
                err
            );
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .init();

    guard
}

fn daily_appender(
    log_dir: &Path,
) -> Result<RollingFileAppender, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)?;
    Ok(appender)
}
