use ratatui::widgets::ListState;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::collector::VideoEntry;
use crate::downloader::download_all;
use crate::host::Host;
use crate::web::{AddressBar, parse_address};
use crate::workflow::{COULD_NOT_SCAN, WorkflowEvent, run_scan};

pub const READY: &str = "Ready";
pub const COPIED: &str = "Copied to clipboard.";
pub const COULD_NOT_COPY: &str = "Could not copy to clipboard.";
pub const COULD_NOT_OPEN: &str = "Could not open the link in a browser.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Editing the page address.
  Address,
  /// Navigating the result list.
  Results,
}

/// Popup state for one session: rendered entries, status text, and the scan trigger.
pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub entries: Vec<VideoEntry>,
  pub list_state: ListState,
  /// Latest phase/outcome text. Overwritten by every event, never appended.
  pub status: String,
  pub should_quit: bool,
  host: Host,
  address_bar: Arc<AddressBar>,
  events_tx: mpsc::UnboundedSender<WorkflowEvent>,
  events_rx: mpsc::UnboundedReceiver<WorkflowEvent>,
  /// Present while a scan runs; the trigger is disabled until it is cleared.
  scan_handle: Option<JoinHandle<()>>,
}

impl App {
  pub fn new(host: Host, address_bar: Arc<AddressBar>) -> Self {
    let input = address_bar.current().map(|u| u.to_string()).unwrap_or_default();
    let cursor_position = input.chars().count();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    Self {
      input,
      cursor_position,
      input_scroll: 0,
      mode: AppMode::Address,
      entries: Vec::new(),
      list_state: ListState::default(),
      status: READY.to_string(),
      should_quit: false,
      host,
      address_bar,
      events_tx,
      events_rx,
      scan_handle: None,
    }
  }

  pub fn is_scanning(&self) -> bool {
    self.scan_handle.is_some()
  }

  pub fn downloads_in_flight(&self) -> usize {
    self.host.downloads.in_flight()
  }

  pub fn selected_entry(&self) -> Option<&VideoEntry> {
    self.list_state.selected().and_then(|i| self.entries.get(i))
  }

  /// Apply one workflow event to the popup state.
  pub fn apply(&mut self, event: WorkflowEvent) {
    match event {
      WorkflowEvent::Status(text) => {
        self.status = text;
      }
      WorkflowEvent::Render(entries) => {
        self.entries = entries;
        if self.entries.is_empty() {
          self.list_state.select(None);
          if self.mode == AppMode::Results {
            self.mode = AppMode::Address;
          }
        } else {
          self.list_state.select(Some(0));
          self.mode = AppMode::Results;
        }
      }
    }
  }

  /// Start a scan of the page in the address bar, unless one is already running.
  pub fn trigger_scan(&mut self) {
    if self.is_scanning() {
      debug!("scan already in flight, trigger ignored");
      return;
    }

    let url = parse_address(&self.input);
    if let Some(ref url) = url {
      self.input = url.to_string();
      self.cursor_position = self.input.chars().count();
    }
    info!(url = ?url.as_ref().map(|u| u.as_str()), "scan triggered");
    self.address_bar.set(url);

    let host = self.host.clone();
    let tx = self.events_tx.clone();
    self.scan_handle = Some(tokio::spawn(async move {
      run_scan(&host, &tx).await;
    }));
  }

  /// Drain queued events and re-enable the trigger once the scan task has ended.
  pub async fn check_pending(&mut self) {
    let finished = self.scan_handle.as_ref().is_some_and(JoinHandle::is_finished);

    while let Ok(event) = self.events_rx.try_recv() {
      self.apply(event);
    }

    if finished && let Some(handle) = self.scan_handle.take() {
      if let Err(e) = handle.await {
        error!(err = %e, "scan task failed");
        self.status = COULD_NOT_SCAN.to_string();
      }
    }
  }

  pub fn copy_selected(&mut self) {
    let Some(entry) = self.selected_entry().cloned() else { return };
    let clipboard = Arc::clone(&self.host.clipboard);
    let tx = self.events_tx.clone();

    tokio::spawn(async move {
      let status = match clipboard.write_text(&entry.url).await {
        Ok(()) => COPIED,
        Err(e) => {
          error!(err = %format!("{e:#}"), "clipboard error");
          COULD_NOT_COPY
        }
      };
      let _ = tx.send(WorkflowEvent::Status(status.to_string()));
    });
  }

  /// Re-run the downloader on the selected entry alone.
  pub fn download_selected(&mut self) {
    let Some(entry) = self.selected_entry().cloned() else { return };
    let downloads = Arc::clone(&self.host.downloads);
    let tx = self.events_tx.clone();

    tokio::spawn(async move {
      let report = download_all(downloads.as_ref(), std::slice::from_ref(&entry)).await;
      let _ = tx.send(WorkflowEvent::Status(report.status_message()));
    });
  }

  /// Follow the selected entry's link in the system browser.
  pub fn open_selected(&mut self) {
    let Some(entry) = self.selected_entry() else { return };
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";

    match std::process::Command::new(cmd)
      .arg(&entry.url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        // Reap the child in a background thread to avoid zombie processes.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
      }
      Err(e) => {
        warn!(url = %entry.url, err = %e, "failed to open browser");
        self.status = COULD_NOT_OPEN.to_string();
      }
    }
  }

  pub fn select_next(&mut self) {
    let count = self.entries.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.entries.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }
}
