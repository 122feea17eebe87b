//! Host capabilities consumed by the scan workflow.
//!
//! Everything the workflow needs from its environment (which page is active, running the
//! scraper inside every frame, the download manager, the clipboard) sits behind one of the
//! traits below. Requests and results are plain data so a host may run them across a
//! process or sandbox boundary.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::error::DownloadError;
use crate::page::{FrameDocument, ScanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "tab-{}", self.0)
  }
}

/// The active tab of the focused window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
  pub id: TabId,
  pub url: Url,
}

/// Self-contained routine executed inside a frame. It sees only the frame document and
/// returns plain data.
pub type FrameScript = fn(&FrameDocument) -> ScanResult;

#[derive(Debug, Clone)]
pub struct InjectionTarget {
  pub tab: Tab,
  pub all_frames: bool,
}

impl InjectionTarget {
  pub fn all_frames(tab: Tab) -> Self {
    Self { tab, all_frames: true }
  }
}

/// One record per frame the host reached. `result` is `None` when the routine could not
/// run there (fetch failure, unsupported scheme, no document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionResult {
  pub frame_id: usize,
  pub result: Option<ScanResult>,
}

/// What to do when the suggested filename already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictAction {
  /// Append a ` (n)` suffix before the extension.
  #[default]
  Uniquify,
  Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
  pub url: String,
  pub filename: String,
  pub conflict_action: ConflictAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadId(pub u64);

#[async_trait]
pub trait TabHost: Send + Sync {
  /// Active tab of the focused window, or `None` if there isn't one.
  async fn active_tab(&self) -> Result<Option<Tab>>;
}

#[async_trait]
pub trait ScriptHost: Send + Sync {
  /// Run `script` in the target tab's frames. Errors are reserved for failures of the
  /// call as a whole; per-frame failures show up as absent results.
  async fn execute_script(&self, target: &InjectionTarget, script: FrameScript) -> Result<Vec<InjectionResult>>;
}

#[async_trait]
pub trait DownloadHost: Send + Sync {
  /// Resolves once the download has been accepted, not when it has finished.
  async fn download(&self, request: DownloadRequest) -> Result<DownloadId, DownloadError>;

  /// Transfers accepted but not yet finished.
  fn in_flight(&self) -> usize {
    0
  }

  /// Wait for every accepted transfer to finish.
  async fn settle(&self) {}
}

#[async_trait]
pub trait ClipboardHost: Send + Sync {
  async fn write_text(&self, text: &str) -> Result<()>;
}

/// Handles to every host capability, injected into the controller once per session.
#[derive(Clone)]
pub struct Host {
  pub tabs: Arc<dyn TabHost>,
  pub scripting: Arc<dyn ScriptHost>,
  pub downloads: Arc<dyn DownloadHost>,
  pub clipboard: Arc<dyn ClipboardHost>,
}
