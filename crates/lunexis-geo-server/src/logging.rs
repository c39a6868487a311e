//! Logging initialization and configuration.
//!
//! This module provides environment-aware logging setup:
//! - **Production**: JSON logs to rolling files + compact logs to stdout
//! - **Development**: Pretty logs to stdout with span events
//!
//! The watch loop logs every dropped reading and subscriber failure at
//! `warn`, and every delivered update at `debug`, so `info` is the useful
//! default for a long-running server.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting the deployment mode.
pub const ENV_MODE_VAR: &str = "LUNEXIS_GEO_ENV";

/// Environment variable with the fallback filter when `RUST_LOG` is unset.
pub const LOG_LEVEL_VAR: &str = "LUNEXIS_GEO_LOG_LEVEL";

/// Environment variable overriding the production log directory.
pub const LOG_DIR_VAR: &str = "LUNEXIS_GEO_LOG_DIR";

/// Filter used when neither `RUST_LOG` nor `LUNEXIS_GEO_LOG_LEVEL` is set.
///
/// The HTTP client stack logs every connection at `debug`, which drowns the
/// geocoding lines, so it is held at `warn`.
pub const DEFAULT_FILTER: &str = "info,hyper_util=warn,reqwest=warn";

/// Prefix of the rolling log files, e.g. `lunexis-geo.2025-01-15`.
const LOG_FILE_PREFIX: &str = "lunexis-geo";

/// Static guards to keep non-blocking writers alive.
/// These must persist for the lifetime of the program.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static STDOUT_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Whether `LUNEXIS_GEO_ENV` asks for production logging.
#[must_use]
pub fn is_production() -> bool {
    is_production_mode(std::env::var(ENV_MODE_VAR).ok().as_deref())
}

fn is_production_mode(mode: Option<&str>) -> bool {
    mode.is_some_and(|mode| {
        let mode = mode.trim();
        mode.eq_ignore_ascii_case("production") || mode.eq_ignore_ascii_case("prod")
    })
}

/// Build the filter: `RUST_LOG`, else `LUNEXIS_GEO_LOG_LEVEL`, else
/// [`DEFAULT_FILTER`].
fn env_filter() -> anyhow::Result<EnvFilter> {
    let log_level = std::env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?)
}

/// Initialize the logging system with environment-appropriate configuration.
///
/// # Production Mode
///
/// - Logs to rolling daily files in `/var/log/lunexis-geo/` (or
///   `LUNEXIS_GEO_LOG_DIR`)
/// - Also logs to stdout for systemd journal capture
/// - JSON format for structured logging in files
/// - Compact format for stdout (no ANSI colors)
///
/// If the log directory cannot be created, only stdout is used and a
/// warning names the directory.
///
/// # Development Mode
///
/// - Logs to stdout only with pretty formatting
/// - Includes span events for debugging
/// - ANSI colors enabled
///
/// # Errors
///
/// Returns an error if the env filter cannot be parsed.
pub fn init(is_production: bool) -> anyhow::Result<()> {
    let env_filter = env_filter()?;

    if is_production {
        init_production(env_filter);
    } else {
        init_development(env_filter);
    }

    Ok(())
}

/// Initialize production logging with file + stdout output.
fn init_production(env_filter: EnvFilter) {
    let log_dir = log_directory(std::env::var(LOG_DIR_VAR).ok());

    // Non-blocking writer for stdout
    let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    // Stdout layer - compact format for journald, no ANSI colors
    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_stdout)
        .with_target(true)
        .with_ansi(false);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);
    let _ = STDOUT_GUARD.set(stdout_guard);

    match ensure_log_directory(&log_dir) {
        Ok(()) => {
            // Rolling file appender - creates new file daily
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
            let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

            // File layer - JSON format, one object per event
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            registry.with(file_layer).init();
            let _ = FILE_GUARD.set(file_guard);
        }
        Err(e) => {
            registry.init();
            warn!(
                dir = %log_dir.display(),
                error = %e,
                "cannot create log directory, logging to stdout only"
            );
        }
    }
}

/// Initialize development logging with pretty stdout output.
fn init_development(env_filter: EnvFilter) {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}

fn ensure_log_directory(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
}

/// Returns the log directory: the override if non-empty, else the platform
/// default.
fn log_directory(override_dir: Option<String>) -> PathBuf {
    if let Some(dir) = override_dir.filter(|dir| !dir.trim().is_empty()) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/var/log/lunexis-geo")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "lunexis-geo")
            .map_or_else(|| PathBuf::from("./logs"), |dirs| dirs.data_dir().join("logs"))
    }
}
