use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::host::{Host, InjectionResult, InjectionTarget};
use crate::page::scrape_videos;

/// A video source found on the page, attributed to the first frame that exposed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
  pub url: String,
  pub frame_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
  NoActiveTab,
  /// Possibly empty; unique by `url`.
  Entries(Vec<VideoEntry>),
}

/// Run the page scraper in every frame of the active tab and merge the results.
pub async fn collect_videos(host: &Host) -> Result<Collection> {
  let Some(tab) = host.tabs.active_tab().await.context("Failed to query the active tab")? else {
    return Ok(Collection::NoActiveTab);
  };
  info!(tab = %tab.id, url = %tab.url, "collector: scanning frames");

  let injections = host
    .scripting
    .execute_script(&InjectionTarget::all_frames(tab), scrape_videos)
    .await
    .context("Failed to run the scraper in the page's frames")?;

  Ok(Collection::Entries(merge_injections(injections)))
}

/// Flatten per-frame results in frame order, keeping the first occurrence of every URL.
pub fn merge_injections(injections: Vec<InjectionResult>) -> Vec<VideoEntry> {
  let mut seen = HashSet::new();
  let mut collected = Vec::new();

  for injection in injections {
    let Some(result) = injection.result else {
      debug!(frame_id = injection.frame_id, "collector: frame could not be scanned");
      continue;
    };
    if result.urls.is_empty() {
      debug!(frame_id = injection.frame_id, frame_url = %result.frame_url, "collector: frame has no videos");
    }
    for url in result.urls {
      if !seen.insert(url.clone()) {
        continue;
      }
      collected.push(VideoEntry { url, frame_url: result.frame_url.clone() });
    }
  }

  collected
}
