//! The scan sequence: collect, render, download, report.
//!
//! `run_scan` never returns an error; every outcome is turned into status events so the
//! controller only has to apply what it receives.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::collector::{Collection, VideoEntry, collect_videos};
use crate::downloader::download_all;
use crate::host::Host;

pub const SCANNING: &str = "Scanning current page and its iframes...";
pub const NO_ACTIVE_TAB: &str = "No active tab detected.";
pub const NO_VIDEOS: &str = "No video elements found on this page or its iframes.";
pub const COULD_NOT_SCAN: &str = "Could not scan the page. Check the log for details.";

/// Updates the workflow asks the controller to apply, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
  /// Overwrite the status text.
  Status(String),
  /// Replace every rendered entry.
  Render(Vec<VideoEntry>),
}

pub type EventSender = mpsc::UnboundedSender<WorkflowEvent>;

pub fn found_message(count: usize) -> String {
  let plural = if count > 1 { "s" } else { "" };
  format!("Found {} video URL{}. Starting downloads...", count, plural)
}

fn emit(events: &EventSender, event: WorkflowEvent) {
  // The controller may already be gone on shutdown.
  let _ = events.send(event);
}

pub async fn run_scan(host: &Host, events: &EventSender) {
  emit(events, WorkflowEvent::Status(SCANNING.to_string()));
  emit(events, WorkflowEvent::Render(Vec::new()));

  if let Err(e) = scan_and_download(host, events).await {
    error!(err = %format!("{e:#}"), "workflow: scan failed");
    emit(events, WorkflowEvent::Status(COULD_NOT_SCAN.to_string()));
  }
}

async fn scan_and_download(host: &Host, events: &EventSender) -> Result<()> {
  let collected = match collect_videos(host).await? {
    Collection::NoActiveTab => {
      info!("workflow: no active tab");
      emit(events, WorkflowEvent::Status(NO_ACTIVE_TAB.to_string()));
      return Ok(());
    }
    Collection::Entries(entries) => entries,
  };

  if collected.is_empty() {
    emit(events, WorkflowEvent::Status(NO_VIDEOS.to_string()));
    return Ok(());
  }

  info!(count = collected.len(), "workflow: videos collected");
  emit(events, WorkflowEvent::Status(found_message(collected.len())));
  emit(events, WorkflowEvent::Render(collected.clone()));

  let report = download_all(host.downloads.as_ref(), &collected).await;
  emit(events, WorkflowEvent::Status(report.status_message()));
  Ok(())
}
