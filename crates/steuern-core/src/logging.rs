//! Logging infrastructure for steuern.
//!
//! Structured logging through the `tracing` ecosystem. The panel owns the
//! terminal while it runs, so log output goes to a file only.
//!
//! ## Features
//!
//! - JSON lines format for machine parsing
//! - Daily rolling file under `~/.steuern/logs/`
//! - `RUST_LOG` override, `-v` for debug level
//!
//! ## Example
//!
//! ```no_run
//! use steuern_core::logging;
//!
//! let _guard = logging::init_logging(None, false).expect("logging init");
//!
//! tracing::info!("panel started");
//! tracing::debug!(project_id = 7, "fetching next task");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{Result, SteuernError};

/// File name prefix of the rolling log.
pub const LOG_FILE_NAME: &str = "steuern.log";

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the steuern logging system.
///
/// Sets up JSON file logging to `log_dir` (default `~/.steuern/logs/`).
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory
/// * `verbose` - If true, sets log level to DEBUG. Otherwise uses INFO.
///
/// # Returns
///
/// A [`LogGuard`] that must be held for the application lifetime.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| SteuernError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("steuern={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| SteuernError::Internal {
            message: format!("tracing subscriber already set: {e}"),
        })?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal logging for tests.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Get the steuern home directory (`~/.steuern`).
pub fn steuern_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".steuern"))
        .ok_or_else(|| SteuernError::Internal {
            message: "home directory could not be determined".into(),
        })
}

/// Get the default log directory path.
///
/// Returns `~/.steuern/logs/`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(steuern_home()?.join("logs"))
}

/// Logs a dispatch lifecycle event for a backend action.
///
/// # Example
///
/// ```ignore
/// log_action_event!("auftrag", "started", ticket = 3);
/// log_action_event!("upload", "failed", error = %err);
/// ```
#[macro_export]
macro_rules! log_action_event {
    ($action:expr, $event:expr) => {
        tracing::info!(
            target: "steuern::action",
            action = $action,
            event = $event,
            "action event"
        )
    };
    ($action:expr, $event:expr, $($field:tt)*) => {
        tracing::info!(
            target: "steuern::action",
            action = $action,
            event = $event,
            $($field)*,
            "action event"
        )
    };
}
