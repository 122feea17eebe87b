use tracing::{info, warn};
use url::Url;

use crate::collector::VideoEntry;
use crate::host::{ConflictAction, DownloadHost, DownloadRequest};

/// Filename used when a URL has no usable path segment.
pub const FALLBACK_FILENAME: &str = "video.mp4";

pub const NONE_DOWNLOADABLE: &str =
  "Found URLs but none are direct http/https; blob/data cannot be downloaded directly.";
pub const NOTHING_DOWNLOADED: &str = "Nothing downloaded.";

/// Tally of one `download_all` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
  pub started: usize,
  pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadReport {
  /// No entry had an http/https URL; no download was requested.
  NoneDownloadable,
  Attempted(DownloadOutcome),
}

impl DownloadReport {
  pub fn status_message(&self) -> String {
    match self {
      DownloadReport::NoneDownloadable => NONE_DOWNLOADABLE.to_string(),
      DownloadReport::Attempted(outcome) => {
        let mut pieces = Vec::new();
        if outcome.started > 0 {
          let plural = if outcome.started > 1 { "s" } else { "" };
          pieces.push(format!("started {} download{}", outcome.started, plural));
        }
        if outcome.failed > 0 {
          pieces.push(format!("{} failed", outcome.failed));
        }
        if pieces.is_empty() { NOTHING_DOWNLOADED.to_string() } else { pieces.join("; ") }
      }
    }
  }
}

/// Whether the host download facility can fetch this URL directly (`http:`/`https:`, any case).
pub fn is_downloadable(url: &str) -> bool {
  let lower = url.get(..6).unwrap_or(url).to_ascii_lowercase();
  lower.starts_with("http:") || lower.starts_with("https:")
}

/// Last non-empty path segment of `url`, or [`FALLBACK_FILENAME`].
pub fn suggest_filename(url: &str) -> String {
  Url::parse(url)
    .ok()
    .and_then(|parsed| {
      parsed.path_segments().and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
    })
    .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Request a download for every http/https entry, one after another.
/// A rejected request is logged and counted; the remaining entries are still attempted.
pub async fn download_all(host: &dyn DownloadHost, entries: &[VideoEntry]) -> DownloadReport {
  let downloadable: Vec<&VideoEntry> = entries.iter().filter(|e| is_downloadable(&e.url)).collect();
  if downloadable.is_empty() {
    info!(total = entries.len(), "downloader: nothing directly downloadable");
    return DownloadReport::NoneDownloadable;
  }

  let mut outcome = DownloadOutcome::default();
  for entry in downloadable {
    let request = DownloadRequest {
      url: entry.url.clone(),
      filename: suggest_filename(&entry.url),
      conflict_action: ConflictAction::Uniquify,
    };
    match host.download(request).await {
      Ok(id) => {
        info!(url = %entry.url, id = id.0, "downloader: download started");
        outcome.started += 1;
      }
      Err(e) => {
        warn!(url = %entry.url, err = %e, "downloader: download failed");
        outcome.failed += 1;
      }
    }
  }

  DownloadReport::Attempted(outcome)
}
