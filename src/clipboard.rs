//! System clipboard host.
//!
//! Some platform clipboards only serve their contents while the owning context is alive, so a
//! single context lives on a dedicated thread for the whole session and requests are sent to it.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use copypasta::{ClipboardContext, ClipboardProvider};
use std::sync::mpsc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::host::ClipboardHost;

type CopyRequest = (String, oneshot::Sender<Result<()>>);

pub struct SystemClipboard {
  requests: mpsc::Sender<CopyRequest>,
}

impl SystemClipboard {
  pub fn spawn() -> Result<Self> {
    let (tx, rx) = mpsc::channel::<CopyRequest>();
    std::thread::Builder::new()
      .name("clipboard".to_string())
      .spawn(move || serve_clipboard(rx))
      .context("Failed to start clipboard thread")?;
    Ok(Self { requests: tx })
  }
}

fn serve_clipboard(rx: mpsc::Receiver<CopyRequest>) {
  let mut context = match ClipboardContext::new() {
    Ok(ctx) => Some(ctx),
    Err(e) => {
      warn!(err = %e, "clipboard: no system clipboard available");
      None
    }
  };

  while let Ok((text, reply)) = rx.recv() {
    let result = match context.as_mut() {
      Some(ctx) => ctx.set_contents(text).map_err(|e| anyhow!("set clipboard contents: {}", e)),
      None => Err(anyhow!("no system clipboard available")),
    };
    let _ = reply.send(result);
  }
  info!("clipboard: thread exiting");
}

#[async_trait]
impl ClipboardHost for SystemClipboard {
  async fn write_text(&self, text: &str) -> Result<()> {
    let (reply_tx, reply_rx) = oneshot::channel();
    self.requests.send((text.to_string(), reply_tx)).map_err(|_| anyhow!("clipboard thread is gone"))?;
    reply_rx.await.context("clipboard thread dropped the request")?
  }
}
