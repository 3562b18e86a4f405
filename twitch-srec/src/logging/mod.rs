//! Logging setup.
//!
//! - Console output with local timezone timestamps
//! - Optional daily rolling log file (non-blocking writer)
//! - Log file retention cleanup at startup

use std::path::Path;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::utils::fs;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "twitch_srec=info,helix_client=info";

/// Filter directive in verbose mode.
pub const VERBOSE_LOG_FILTER: &str = "twitch_srec=debug,helix_client=debug";

/// Prefix of the daily log files, `twitch-srec.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "twitch-srec.log";

/// Log retention period in days.
const LOG_RETENTION_DAYS: i64 = 7;

/// Timestamps in the local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter. When `log_dir` is given, the
/// returned guard must be kept alive for the file writer to flush.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> crate::Result<Option<WorkerGuard>> {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            fs::ensure_dir_all_sync_with_op("creating log directory", dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    if let Some(dir) = log_dir {
        let today = Local::now().date_naive();
        match prune_old_logs(dir, today, LOG_RETENTION_DAYS) {
            Ok(0) => {}
            Ok(count) => info!(count, "Cleaned up old log files"),
            Err(e) => warn!(error = %e, "Failed to cleanup old logs"),
        }
    }

    Ok(guard)
}

/// Delete `twitch-srec.log.YYYY-MM-DD` files older than `retention_days`.
pub fn prune_old_logs(log_dir: &Path, today: NaiveDate, retention_days: i64) -> std::io::Result<usize> {
    let cutoff = today - chrono::Duration::days(retention_days);
    let prefix = format!("{LOG_FILE_PREFIX}.");
    let mut deleted = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(&prefix))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };

        if date < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    deleted += 1;
                    debug!(path = %path.display(), "Deleted old log file");
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete old log file"),
            }
        }
    }
    Ok(deleted)
}
