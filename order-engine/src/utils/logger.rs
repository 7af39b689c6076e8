//! Logging Infrastructure
//!
//! Console output plus optional daily rotating files:
//! - `app/`: everything except the audit target, removed after the retention window
//! - `audit/`: order creation, status changes and deletions, never removed

use chrono::{Local, NaiveDate, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Target used by [`audit_log!`](crate::audit_log)
pub const AUDIT_TARGET: &str = "audit";

/// Days an application log file is kept
pub const APP_LOG_RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Remove application log files older than `retention_days`.
///
/// Returns the number of files deleted. Audit logs are never touched.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> anyhow::Result<usize> {
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Local::now() - chrono::Duration::days(retention_days);
    let mut removed = 0;

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(date) = rotated_file_date(name, "app") else {
            continue;
        };
        let Some(midnight) = date
            .and_hms_opt(0, 0, 0)
            .and_then(|dt| Local.from_local_datetime(&dt).single())
        else {
            continue;
        };
        if midnight < cutoff {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }

    Ok(removed)
}

/// Date of a rotated file named `{prefix}.YYYY-MM-DD` (optionally with `.log`)
fn rotated_file_date(name: &str, prefix: &str) -> Option<NaiveDate> {
    let rest = name.strip_prefix(prefix)?.strip_prefix(['.', '-'])?;
    let date_part = rest.strip_suffix(".log").unwrap_or(rest);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn file_layer<F>(appender: RollingFileAppender, json_format: bool, keep: F) -> BoxedLayer
where
    F: Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(appender));

    if json_format {
        layer.json().with_filter(filter_fn(keep)).boxed()
    } else {
        layer.with_filter(filter_fn(keep)).boxed()
    }
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level when `RUST_LOG` is unset (e.g., "info", "debug")
/// * `json_format` - JSON lines instead of human-readable output
/// * `log_dir` - Optional directory for rotating log files
///
/// Must be called from inside a tokio runtime when `log_dir` is set, since
/// it spawns the hourly cleanup task.
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if json_format {
        layers.push(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(env_filter)
                .boxed(),
        );
    }

    if let Some(log_dir) = log_dir {
        let app_log_dir = log_dir.join("app");
        let audit_log_dir = log_dir.join("audit");
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&audit_log_dir)?;

        let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
        let audit_log = RollingFileAppender::new(Rotation::DAILY, audit_log_dir, "audit");

        layers.push(file_layer(app_log, json_format, |meta| {
            meta.target() != AUDIT_TARGET
        }));
        layers.push(file_layer(audit_log, json_format, |meta| {
            meta.target() == AUDIT_TARGET
        }));

        tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

/// Initialize console-only logging
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;

        if let Err(e) = cleanup_old_logs(&log_dir, APP_LOG_RETENTION_DAYS) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

/// Audit log helper - records order lifecycle operations on the audit target
///
/// ```ignore
/// audit_log!("create", "order:abc123");
/// audit_log!("transition", "order:abc123", "pendiente -> confirmado");
/// ```
#[macro_export]
macro_rules! audit_log {
    ($action:expr, $resource:expr) => {
        tracing::info!(
            target: "audit",
            action = %$action,
            resource = %$resource,
            timestamp = chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
    ($action:expr, $resource:expr, $details:expr) => {
        tracing::info!(
            target: "audit",
            action = %$action,
            resource = %$resource,
            details = %$details,
            timestamp = chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_file_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(rotated_file_date("app.2024-03-09", "app"), Some(d));
        assert_eq!(rotated_file_date("app-2024-03-09.log", "app"), Some(d));
        assert_eq!(rotated_file_date("audit.2024-03-09", "app"), None);
        assert_eq!(rotated_file_date("app.today", "app"), None);
    }

    #[test]
    fn test_cleanup_removes_only_old_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let audit = dir.path().join("audit");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&audit).unwrap();

        let old = (Local::now() - chrono::Duration::days(30)).format("%Y-%m-%d");
        let fresh = Local::now().format("%Y-%m-%d");
        fs::write(app.join(format!("app.{}", old)), "x").unwrap();
        fs::write(app.join(format!("app.{}", fresh)), "x").unwrap();
        fs::write(audit.join(format!("audit.{}", old)), "x").unwrap();

        let removed = cleanup_old_logs(dir.path(), APP_LOG_RETENTION_DAYS).unwrap();
        assert_eq!(removed, 1);
        assert!(app.join(format!("app.{}", fresh)).exists());
        assert!(audit.join(format!("audit.{}", old)).exists());
    }
}
