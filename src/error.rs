use thiserror::Error;

/// Why a download request was rejected.
#[derive(Error, Debug)]
pub enum DownloadError {
  #[error("Invalid URL: {0}")]
  InvalidUrl(String),
  #[error("Unsupported scheme: {0}")]
  UnsupportedScheme(String),
  #[error("HTTP {0}: {1}")]
  HttpStatus(u16, String),
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}
