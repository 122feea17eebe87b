use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::constants;

/// User preferences read from `prefs.toml` in the platform config dir.
/// Every field is optional; missing values fall back to `constants.ron`.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
  pub download_dir: Option<PathBuf>,
  pub max_frame_depth: Option<usize>,
  pub max_frames: Option<usize>,
  pub request_timeout_secs: Option<u64>,
  pub user_agent: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  /// Where downloads land: configured dir, else the user's Downloads folder, else the working dir.
  pub fn download_dir(&self) -> PathBuf {
    if let Some(ref dir) = self.download_dir {
      return dir.clone();
    }
    UserDirs::new().and_then(|d| d.download_dir().map(|p| p.to_path_buf())).unwrap_or_else(|| PathBuf::from("."))
  }

  pub fn max_frame_depth(&self) -> usize {
    self.max_frame_depth.unwrap_or(constants().max_frame_depth)
  }

  pub fn max_frames(&self) -> usize {
    self.max_frames.unwrap_or(constants().max_frames).max(1)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs.unwrap_or(constants().request_timeout_secs))
  }

  pub fn user_agent(&self) -> &str {
    self.user_agent.as_deref().unwrap_or(&constants().user_agent)
  }
}

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "vidsweep")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let config: Config = toml::from_str("max_frame_depth = 2\n").unwrap();
    assert_eq!(config.max_frame_depth(), 2);
    assert_eq!(config.max_frames(), constants().max_frames);
    assert_eq!(config.user_agent(), constants().user_agent);
  }

  #[test]
  fn explicit_download_dir_wins() {
    let config: Config = toml::from_str("download_dir = \"/tmp/videos\"\n").unwrap();
    assert_eq!(config.download_dir(), PathBuf::from("/tmp/videos"));
  }

  #[test]
  fn zero_max_frames_is_clamped() {
    let config = Config { max_frames: Some(0), ..Config::default() };
    assert_eq!(config.max_frames(), 1);
  }

  #[test]
  fn timeout_from_seconds() {
    let config = Config { request_timeout_secs: Some(5), ..Config::default() };
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
  }
}
