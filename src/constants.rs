//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, parsed once on first access via `LazyLock`.
//! Values here are defaults; `prefs.toml` and CLI flags may override some of them.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Frame walking
  pub max_frame_depth: usize,
  pub max_frames: usize,

  // HTTP
  pub request_timeout_secs: u64,
  pub user_agent: String,

  // UI loop
  pub poll_interval_ms: u64,

  // Logging
  pub log_file_name: String,
  pub default_log_filter: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; a malformed file fails the first test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
