//! HTTP download host: the terminal stand-in for a browser's download manager.
//!
//! A request is accepted once the server answers with a success status and the target file
//! has been created. The body is then streamed on a background task, so `download` returns
//! while the transfer is still running.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::downloader::FALLBACK_FILENAME;
use crate::error::DownloadError;
use crate::host::{ConflictAction, DownloadHost, DownloadId, DownloadRequest};

/// Replace characters that are invalid in filenames on common platforms.
pub fn sanitize_filename(filename: &str) -> String {
  let cleaned: String = filename
    .chars()
    .map(|c| match c {
      '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => '_',
      c if c.is_control() => '_',
      c => c,
    })
    .collect();
  let cleaned = cleaned.trim().trim_matches('.').to_string();
  if cleaned.is_empty() { FALLBACK_FILENAME.to_string() } else { cleaned }
}

/// `clip.mp4` → `clip (n).mp4`; `n == 0` returns the name unchanged.
pub fn uniquified_name(filename: &str, n: usize) -> String {
  if n == 0 {
    return filename.to_string();
  }
  let path = Path::new(filename);
  let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
  match path.extension().and_then(|e| e.to_str()) {
    Some(ext) => format!("{} ({}).{}", stem, n, ext),
    None => format!("{} ({})", stem, n),
  }
}

/// Create the file a transfer writes to, applying the collision policy.
async fn create_target(dir: &Path, filename: &str, action: ConflictAction) -> std::io::Result<(PathBuf, File)> {
  if action == ConflictAction::Overwrite {
    let path = dir.join(filename);
    let file = File::create(&path).await?;
    return Ok((path, file));
  }

  let mut n = 0;
  loop {
    let path = dir.join(uniquified_name(filename, n));
    match OpenOptions::new().write(true).create_new(true).open(&path).await {
      Ok(file) => return Ok((path, file)),
      Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
      Err(e) => return Err(e),
    }
  }
}

async fn stream_to_file(response: reqwest::Response, mut file: File) -> Result<u64> {
  let mut stream = response.bytes_stream();
  let mut written = 0u64;
  while let Some(chunk) = stream.next().await {
    let chunk = chunk.context("Error downloading chunk")?;
    file.write_all(&chunk).await.context("Error writing download")?;
    written += chunk.len() as u64;
  }
  file.flush().await.context("Error flushing download")?;
  Ok(written)
}

/// Decrements the in-flight counter when a transfer task ends, however it ends.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::SeqCst);
  }
}

pub struct HttpDownloadHost {
  client: Client,
  dir: PathBuf,
  next_id: AtomicU64,
  in_flight: Arc<AtomicUsize>,
  transfers: Mutex<JoinSet<()>>,
}

impl HttpDownloadHost {
  pub fn new(config: &Config, dir: PathBuf) -> Result<Self> {
    let client = Client::builder().user_agent(config.user_agent()).build().context("Failed to build HTTP client")?;
    Ok(Self::with_client(client, dir))
  }

  pub fn with_client(client: Client, dir: PathBuf) -> Self {
    Self {
      client,
      dir,
      next_id: AtomicU64::new(0),
      in_flight: Arc::new(AtomicUsize::new(0)),
      transfers: Mutex::new(JoinSet::new()),
    }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }
}

#[async_trait]
impl DownloadHost for HttpDownloadHost {
  async fn download(&self, request: DownloadRequest) -> Result<DownloadId, DownloadError> {
    let url = Url::parse(&request.url).map_err(|_| DownloadError::InvalidUrl(request.url.clone()))?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(DownloadError::UnsupportedScheme(url.scheme().to_string()));
    }

    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(DownloadError::HttpStatus(status.as_u16(), status.canonical_reason().unwrap_or_default().to_string()));
    }

    tokio::fs::create_dir_all(&self.dir).await?;
    let filename = sanitize_filename(&request.filename);
    let (path, file) = create_target(&self.dir, &filename, request.conflict_action).await?;

    let id = DownloadId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    self.in_flight.fetch_add(1, Ordering::SeqCst);
    let guard = InFlightGuard(Arc::clone(&self.in_flight));
    info!(id = id.0, path = %path.display(), "transfer: accepted");

    let mut transfers = self.transfers.lock().expect("transfer set mutex poisoned");
    while transfers.try_join_next().is_some() {}
    transfers.spawn(async move {
      let _guard = guard;
      match stream_to_file(response, file).await {
        Ok(bytes) => info!(id = id.0, path = %path.display(), bytes, "transfer: finished"),
        Err(e) => {
          warn!(id = id.0, path = %path.display(), err = %format!("{e:#}"), "transfer: failed, removing partial file");
          let _ = tokio::fs::remove_file(&path).await;
        }
      }
    });

    Ok(id)
  }

  fn in_flight(&self) -> usize {
    self.in_flight.load(Ordering::SeqCst)
  }

  async fn settle(&self) {
    loop {
      let mut pending = std::mem::take(&mut *self.transfers.lock().expect("transfer set mutex poisoned"));
      if pending.is_empty() {
        break;
      }
      while pending.join_next().await.is_some() {}
    }
  }
}
