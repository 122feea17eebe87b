//! Diagnostic log setup.
//!
//! The TUI owns the terminal, so tracing output goes to a daily-rolling file in the
//! platform data dir. Nothing written here is ever shown in the UI.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::project_dirs;
use crate::constants::constants;

/// Directory for log files, falling back to the system temp dir.
pub fn log_dir() -> PathBuf {
  project_dirs().map(|d| d.data_local_dir().join("logs")).unwrap_or_else(|| std::env::temp_dir().join("vidsweep-logs"))
}

/// Install the global subscriber. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init_tracing() -> Result<WorkerGuard> {
  let dir = log_dir();
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&constants().default_log_filter));
  let appender = tracing_appender::rolling::daily(&dir, &constants().log_file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| anyhow::anyhow!(e))
    .context("Failed to install tracing subscriber")?;

  Ok(guard)
}
