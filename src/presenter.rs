use url::Url;

use crate::collector::VideoEntry;

/// Short classification shown next to each entry.
pub fn url_type(url: &str) -> String {
  if url.starts_with("blob:") {
    return "blob".to_string();
  }
  if url.starts_with("data:") {
    return "data URI".to_string();
  }
  match Url::parse(url) {
    Ok(parsed) => parsed.host_str().unwrap_or_default().to_string(),
    Err(_) => "unknown".to_string(),
  }
}

pub fn frame_label(frame_url: &str) -> String {
  if frame_url.is_empty() { "Frame: current page".to_string() } else { format!("Frame: {}", frame_url) }
}

/// Display data for one result card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
  pub link: String,
  pub frame: String,
  pub pill: String,
}

impl From<&VideoEntry> for EntryView {
  fn from(entry: &VideoEntry) -> Self {
    Self { link: entry.url.clone(), frame: frame_label(&entry.frame_url), pill: url_type(&entry.url) }
  }
}

pub fn entry_views(entries: &[VideoEntry]) -> Vec<EntryView> {
  entries.iter().map(EntryView::from).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_blob_and_data() {
    assert_eq!(url_type("blob:abc"), "blob");
    assert_eq!(url_type("data:image/png;base64,xyz"), "data URI");
  }

  #[test]
  fn classifies_by_host() {
    assert_eq!(url_type("https://foo.bar/x.mp4"), "foo.bar");
    assert_eq!(url_type("http://[::1]:8080/v.mp4"), "[::1]");
  }

  #[test]
  fn unparsable_is_unknown() {
    assert_eq!(url_type("not a url at all"), "unknown");
    assert_eq!(url_type(""), "unknown");
  }

  #[test]
  fn hostless_url_has_empty_label() {
    assert_eq!(url_type("file:///tmp/v.mp4"), "");
  }

  #[test]
  fn frame_label_sentinel() {
    assert_eq!(frame_label(""), "Frame: current page");
    assert_eq!(frame_label("https://embed.test/p"), "Frame: https://embed.test/p");
  }

  #[test]
  fn view_from_entry() {
    let entry = VideoEntry { url: "https://cdn.test/a.mp4".into(), frame_url: "https://page.test/".into() };
    assert_eq!(
      EntryView::from(&entry),
      EntryView {
        link: "https://cdn.test/a.mp4".into(),
        frame: "Frame: https://page.test/".into(),
        pill: "cdn.test".into(),
      }
    );
  }
}
