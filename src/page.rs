//! Page scraper: the routine that runs inside one frame and lists its video sources.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static VIDEO_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("video").expect("static selector"));
static SOURCE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("source").expect("static selector"));
static BASE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("base[href]").expect("static selector"));

/// A frame's document as seen from inside the frame.
#[derive(Debug, Clone)]
pub struct FrameDocument {
  /// The frame's own location (after redirects).
  pub location: Url,
  /// Fallback base for relative references; a `<base href>` in `html` takes precedence.
  /// Equal to `location` except for `srcdoc` frames, which inherit the parent's base.
  pub base: Url,
  pub html: String,
}

impl FrameDocument {
  pub fn new(location: Url, html: impl Into<String>) -> Self {
    Self { base: location.clone(), location, html: html.into() }
  }
}

/// What the scraper returns from one frame. Plain data so it can cross the frame boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
  /// Absolute, unique, in discovery order.
  pub urls: Vec<String>,
  pub frame_url: String,
}

/// Effective base URL of a parsed document: the first `<base href>` resolved against the
/// fallback, or the fallback itself when absent or unparsable.
pub fn document_base(html: &Html, fallback: &Url) -> Url {
  html
    .select(&BASE_SELECTOR)
    .next()
    .and_then(|el| el.value().attr("href"))
    .and_then(|href| fallback.join(href).ok())
    .unwrap_or_else(|| fallback.clone())
}

/// Resolve a candidate `src` value against `base`. Empty and malformed candidates yield `None`;
/// an empty `src` is skipped rather than resolved to the document URL.
pub fn resolve_candidate(base: &Url, candidate: &str) -> Option<Url> {
  if candidate.trim().is_empty() {
    return None;
  }
  base.join(candidate).ok()
}

/// Collect `video[src]` and nested `source[src]` URLs from a frame document.
pub fn scrape_videos(doc: &FrameDocument) -> ScanResult {
  let html = Html::parse_document(&doc.html);
  let base = document_base(&html, &doc.base);

  let mut urls = Vec::new();
  let mut seen = HashSet::new();
  let mut push = |candidate: Option<&str>| {
    let Some(resolved) = candidate.and_then(|c| resolve_candidate(&base, c)) else { return };
    let resolved = resolved.to_string();
    if seen.insert(resolved.clone()) {
      urls.push(resolved);
    }
  };

  for video in html.select(&VIDEO_SELECTOR) {
    push(video.value().attr("src"));
    for source in video.select(&SOURCE_SELECTOR) {
      push(source.value().attr("src"));
    }
  }

  ScanResult { urls, frame_url: doc.location.to_string() }
}
