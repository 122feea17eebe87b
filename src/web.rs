//! HTTP-backed tab and frame hosts.
//!
//! The "active tab" is whatever address the user typed. Running a script "in every frame"
//! means fetching the page, handing its document to the script, then walking nested
//! `<iframe>`/`<frame>` documents depth-first in document order and doing the same for each.
//! Nested frames that cannot be loaded yield an absent result; only a failure to load the
//! top-level page fails the call.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use std::sync::{LazyLock, Mutex};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::host::{FrameScript, InjectionResult, InjectionTarget, ScriptHost, Tab, TabHost, TabId};
use crate::page::{FrameDocument, ScanResult, document_base, resolve_candidate};

static FRAME_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("iframe, frame").expect("static selector"));

// --- Tab ---

/// Normalize user input into a page URL. Bare hosts get `https://`.
/// Empty or unparsable input means there is no page to scan.
pub fn parse_address(input: &str) -> Option<Url> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return None;
  }
  match Url::parse(trimmed) {
    Ok(url) => Some(url),
    Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", trimmed)).ok(),
    Err(_) => None,
  }
}

/// The single tab of the terminal "browser": the address currently in the address bar.
#[derive(Default)]
pub struct AddressBar {
  url: Mutex<Option<Url>>,
}

impl AddressBar {
  pub fn new(url: Option<Url>) -> Self {
    Self { url: Mutex::new(url) }
  }

  pub fn set(&self, url: Option<Url>) {
    *self.url.lock().expect("address bar mutex poisoned") = url;
  }

  pub fn current(&self) -> Option<Url> {
    self.url.lock().expect("address bar mutex poisoned").clone()
  }
}

#[async_trait]
impl TabHost for AddressBar {
  async fn active_tab(&self) -> Result<Option<Tab>> {
    Ok(self.current().map(|url| Tab { id: TabId(1), url }))
  }
}

// --- Frames ---

/// Where a nested frame's document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSource {
  Remote(Url),
  /// `<iframe srcdoc>`: inline markup inheriting the parent's base URL.
  Inline { html: String, base: Url },
  /// `about:blank` or a frame without `src`.
  Blank,
  /// A frame the host cannot enter (`javascript:`, `data:`, malformed `src`, ...).
  Unreachable(String),
}

/// List the nested frames of a document, in document order.
pub fn child_frames(doc: &FrameDocument) -> Vec<FrameSource> {
  let html = Html::parse_document(&doc.html);
  let base = document_base(&html, &doc.base);

  html
    .select(&FRAME_SELECTOR)
    .map(|el| {
      let attrs = el.value();
      if attrs.name() == "iframe"
        && let Some(srcdoc) = attrs.attr("srcdoc")
      {
        return FrameSource::Inline { html: srcdoc.to_string(), base: base.clone() };
      }
      let Some(src) = attrs.attr("src").filter(|s| !s.trim().is_empty()) else {
        return FrameSource::Blank;
      };
      match resolve_candidate(&base, src) {
        Some(url) if matches!(url.scheme(), "http" | "https") => FrameSource::Remote(url),
        Some(url) if url.as_str() == "about:blank" => FrameSource::Blank,
        Some(url) => FrameSource::Unreachable(format!("unsupported scheme {}", url.scheme())),
        None => FrameSource::Unreachable(format!("malformed src {:?}", src)),
      }
    })
    .collect()
}

struct PendingFrame {
  source: FrameSource,
  depth: usize,
}

pub struct HttpFrameHost {
  client: Client,
  max_depth: usize,
  max_frames: usize,
}

impl HttpFrameHost {
  pub fn new(config: &Config) -> Result<Self> {
    let client = Client::builder()
      .user_agent(config.user_agent())
      .timeout(config.request_timeout())
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self::with_client(client, config.max_frame_depth(), config.max_frames()))
  }

  pub fn with_client(client: Client, max_depth: usize, max_frames: usize) -> Self {
    Self { client, max_depth, max_frames }
  }

  /// Fetch a remote frame. Media responses get a synthetic document wrapping the media URL,
  /// the way a browser shows a video opened directly in a frame.
  async fn fetch(&self, url: &Url) -> Result<FrameDocument> {
    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .with_context(|| format!("Failed to fetch {}", url))?
      .error_for_status()
      .with_context(|| format!("Bad status for {}", url))?;

    let location = response.url().clone();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(|v| v.to_ascii_lowercase())
      .unwrap_or_default();

    if content_type.starts_with("video/") {
      let html = format!(r#"<video controls><source src="{}"></video>"#, location.as_str().replace('"', "%22"));
      return Ok(FrameDocument::new(location, html));
    }
    if !(content_type.is_empty() || content_type.contains("html") || content_type.starts_with("text/")) {
      return Ok(FrameDocument::new(location, String::new()));
    }

    let html = response.text().await.with_context(|| format!("Failed to read body of {}", url))?;
    Ok(FrameDocument::new(location, html))
  }

  async fn load(&self, source: &FrameSource) -> Result<FrameDocument> {
    match source {
      FrameSource::Remote(url) => self.fetch(url).await,
      FrameSource::Inline { html, base } => {
        let location = Url::parse("about:srcdoc").context("about:srcdoc")?;
        Ok(FrameDocument { location, base: base.clone(), html: html.clone() })
      }
      FrameSource::Blank => Ok(FrameDocument::new(Url::parse("about:blank").context("about:blank")?, String::new())),
      FrameSource::Unreachable(reason) => Err(anyhow!("frame unreachable: {}", reason)),
    }
  }
}

/// Run the script off the async runtime. A panic inside it counts as "no result".
async fn run_in_frame(script: FrameScript, doc: FrameDocument) -> Option<ScanResult> {
  let frame_url = doc.location.to_string();
  match tokio::task::spawn_blocking(move || script(&doc)).await {
    Ok(result) => Some(result),
    Err(e) => {
      warn!(frame_url = %frame_url, err = %e, "frames: script did not complete");
      None
    }
  }
}

#[async_trait]
impl ScriptHost for HttpFrameHost {
  async fn execute_script(&self, target: &InjectionTarget, script: FrameScript) -> Result<Vec<InjectionResult>> {
    let mut results = Vec::new();
    let mut stack = vec![PendingFrame { source: FrameSource::Remote(target.tab.url.clone()), depth: 0 }];

    while let Some(frame) = stack.pop() {
      if results.len() >= self.max_frames {
        warn!(limit = self.max_frames, skipped = stack.len() + 1, "frames: frame limit reached");
        break;
      }
      let frame_id = results.len();

      let doc = match self.load(&frame.source).await {
        Ok(doc) => doc,
        Err(e) if frame_id == 0 => return Err(e).context("Failed to load the page"),
        Err(e) => {
          debug!(frame_id, err = %format!("{e:#}"), "frames: frame skipped");
          results.push(InjectionResult { frame_id, result: None });
          continue;
        }
      };

      if target.all_frames && frame.depth < self.max_depth {
        // Reverse so the first child in document order is popped next.
        for source in child_frames(&doc).into_iter().rev() {
          stack.push(PendingFrame { source, depth: frame.depth + 1 });
        }
      }

      let result = run_in_frame(script, doc).await;
      results.push(InjectionResult { frame_id, result });
    }

    if results.is_empty() {
      bail!("no frames were loaded");
    }
    info!(tab = %target.tab.id, frames = results.len(), "frames: script executed");
    Ok(results)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixture::{Route, client, serve};
  use crate::page::scrape_videos;

  fn doc(location: &str, html: &str) -> FrameDocument {
    FrameDocument::new(Url::parse(location).unwrap(), html)
  }

  fn target(url: &Url) -> InjectionTarget {
    InjectionTarget::all_frames(Tab { id: TabId(1), url: url.clone() })
  }

  // --- parse_address ---

  #[test]
  fn address_parsing() {
    assert_eq!(parse_address("  "), None);
    assert_eq!(parse_address("example.com/watch").unwrap().as_str(), "https://example.com/watch");
    assert_eq!(parse_address("http://a.test/x").unwrap().as_str(), "http://a.test/x");
    assert_eq!(parse_address("http://[::1"), None);
  }

  #[tokio::test]
  async fn address_bar_is_the_active_tab() {
    let bar = AddressBar::default();
    assert_eq!(bar.active_tab().await.unwrap(), None);
    bar.set(parse_address("https://page.test/"));
    let tab = bar.active_tab().await.unwrap().unwrap();
    assert_eq!(tab.url.as_str(), "https://page.test/");
  }

  // --- child_frames ---

  #[test]
  fn child_frames_in_document_order() {
    let frames = child_frames(&doc(
      "https://page.test/dir/index.html",
      r#"<iframe src="player.html"></iframe>
         <iframe srcdoc="<video src='x.mp4'></video>"></iframe>
         <iframe></iframe>
         <iframe src="javascript:void(0)"></iframe>"#,
    ));
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0], FrameSource::Remote(Url::parse("https://page.test/dir/player.html").unwrap()));
    assert_eq!(
      frames[1],
      FrameSource::Inline {
        html: "<video src='x.mp4'></video>".to_string(),
        base: Url::parse("https://page.test/dir/index.html").unwrap()
      }
    );
    assert_eq!(frames[2], FrameSource::Blank);
    assert!(matches!(frames[3], FrameSource::Unreachable(_)));
  }

  #[test]
  fn frameset_frames_are_found() {
    let frames = child_frames(&doc(
      "https://page.test/",
      r#"<html><frameset><frame src="/nav"><frame src="data:text/html,hi"></frameset></html>"#,
    ));
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], FrameSource::Remote(Url::parse("https://page.test/nav").unwrap()));
    assert!(matches!(frames[1], FrameSource::Unreachable(_)));
  }

  #[test]
  fn child_frames_honor_base_href() {
    let frames = child_frames(&doc(
      "https://page.test/",
      r#"<base href="https://embeds.test/v/"><iframe src="p.html"></iframe><iframe src="about:blank"></iframe>"#,
    ));
    assert_eq!(
      frames,
      vec![FrameSource::Remote(Url::parse("https://embeds.test/v/p.html").unwrap()), FrameSource::Blank]
    );
  }

  // --- HttpFrameHost ---

  #[tokio::test]
  async fn walks_nested_frames_depth_first() {
    let base = serve(vec![
      ("/", Route::html(r#"<video src="top.mp4"></video><iframe src="/a"></iframe><iframe src="/b"></iframe>"#)),
      ("/a", Route::html(r#"<iframe src="/a/inner"></iframe><video src="/top.mp4"></video>"#)),
      ("/a/inner", Route::html(r#"<video><source src="deep.webm"></video>"#)),
      ("/b", Route::html(r#"<video src="b.mp4"></video>"#)),
    ])
    .await;
    let host = HttpFrameHost::with_client(client(), 4, 32);

    let at = |path: &str| base.join(path).unwrap().to_string();

    let results = host.execute_script(&target(&base), scrape_videos).await.unwrap();
    let frame_urls: Vec<String> = results.iter().map(|r| r.result.as_ref().unwrap().frame_url.clone()).collect();
    assert_eq!(frame_urls, vec![at("/"), at("/a"), at("/a/inner"), at("/b")]);
    assert_eq!(results[2].result.as_ref().unwrap().urls, vec![at("/a/deep.webm")]);
    assert_eq!(results.iter().map(|r| r.frame_id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
  }

  #[tokio::test]
  async fn failing_nested_frame_is_absent() {
    let base = serve(vec![
      ("/", Route::html(r#"<iframe src="/missing"></iframe><iframe src="/ok"></iframe>"#)),
      ("/ok", Route::html(r#"<video src="ok.mp4"></video>"#)),
    ])
    .await;
    let host = HttpFrameHost::with_client(client(), 4, 32);

    let results = host.execute_script(&target(&base), scrape_videos).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[1].result.is_none());
    assert_eq!(results[2].result.as_ref().unwrap().urls, vec![base.join("/ok.mp4").unwrap().to_string()]);
  }

  #[tokio::test]
  async fn top_level_failure_fails_the_call() {
    let base = serve(vec![("/", Route::status(500))]).await;
    let host = HttpFrameHost::with_client(client(), 4, 32);
    assert!(host.execute_script(&target(&base), scrape_videos).await.is_err());
  }

  #[tokio::test]
  async fn redirect_sets_frame_url() {
    let base = serve(vec![("/", Route::redirect("/landing")), ("/landing", Route::html(r#"<video src="v.mp4"></video>"#))])
      .await;
    let host = HttpFrameHost::with_client(client(), 4, 32);

    let results = host.execute_script(&target(&base), scrape_videos).await.unwrap();
    let result = results[0].result.as_ref().unwrap();
    assert_eq!(result.frame_url, base.join("/landing").unwrap().to_string());
    assert_eq!(result.urls, vec![base.join("/v.mp4").unwrap().to_string()]);
  }

  #[tokio::test]
  async fn media_frame_exposes_its_own_url() {
    let base = serve(vec![
      ("/", Route::html(r#"<iframe src="/clip.mp4"></iframe>"#)),
      ("/clip.mp4", Route::bytes("video/mp4", b"\x00\x00\x00\x18ftyp")),
    ])
    .await;
    let host = HttpFrameHost::with_client(client(), 4, 32);

    let results = host.execute_script(&target(&base), scrape_videos).await.unwrap();
    assert_eq!(results[1].result.as_ref().unwrap().urls, vec![base.join("/clip.mp4").unwrap().to_string()]);
  }

  #[tokio::test]
  async fn depth_and_frame_limits() {
    let base = serve(vec![
      ("/", Route::html(r#"<iframe src="/1"></iframe><iframe src="/2"></iframe>"#)),
      ("/1", Route::html(r#"<iframe src="/1/deeper"></iframe>"#)),
      ("/1/deeper", Route::html("")),
      ("/2", Route::html("")),
    ])
    .await;

    let shallow = HttpFrameHost::with_client(client(), 1, 32);
    let results = shallow.execute_script(&target(&base), scrape_videos).await.unwrap();
    assert_eq!(results.len(), 3);

    let capped = HttpFrameHost::with_client(client(), 4, 2);
    let results = capped.execute_script(&target(&base), scrape_videos).await.unwrap();
    assert_eq!(results.len(), 2);
  }

  #[tokio::test]
  async fn main_frame_only_when_not_all_frames() {
    let base = serve(vec![("/", Route::html(r#"<iframe src="/x"></iframe>"#)), ("/x", Route::html(""))]).await;
    let host = HttpFrameHost::with_client(client(), 4, 32);
    let mut single = target(&base);
    single.all_frames = false;
    let results = host.execute_script(&single, scrape_videos).await.unwrap();
    assert_eq!(results.len(), 1);
  }
}
