mod app;
mod clipboard;
mod collector;
mod config;
mod constants;
mod downloader;
mod error;
#[cfg(test)]
mod fixture;
mod host;
mod input;
mod logging;
mod page;
mod presenter;
mod theme;
mod transfer;
mod ui;
mod web;
mod workflow;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use app::App;
use clipboard::SystemClipboard;
use config::Config;
use constants::constants;
use host::Host;
use presenter::entry_views;
use transfer::HttpDownloadHost;
use web::{AddressBar, HttpFrameHost, parse_address};
use workflow::{WorkflowEvent, run_scan};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Page to scan on startup. Bare hosts get https:// prepended.
  url: Option<String>,

  /// Directory downloads are saved to (default: prefs.toml, else your Downloads folder)
  #[arg(short = 'o', long)]
  download_dir: Option<PathBuf>,

  /// How many levels of nested frames to follow
  #[arg(long)]
  max_frame_depth: Option<usize>,

  /// Scan once, print the results, wait for downloads to finish, and exit
  #[arg(long)]
  headless: bool,

  /// With --headless, print one JSON object per video instead of text
  #[arg(long, requires = "headless")]
  json: bool,

  /// Print a shell completion script and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = match logging::init_tracing() {
    Ok(guard) => Some(guard),
    Err(e) => {
      eprintln!("vidsweep: logging disabled: {:#}", e);
      None
    }
  };

  let mut config = Config::load();
  if args.download_dir.is_some() {
    config.download_dir = args.download_dir.clone();
  }
  if args.max_frame_depth.is_some() {
    config.max_frame_depth = args.max_frame_depth;
  }

  let address_bar = Arc::new(AddressBar::new(args.url.as_deref().and_then(parse_address)));
  let downloads = HttpDownloadHost::new(&config, config.download_dir()).context("Failed to set up downloads")?;
  info!(dir = %downloads.dir().display(), headless = args.headless, "vidsweep starting");

  let host = Host {
    tabs: address_bar.clone(),
    scripting: Arc::new(HttpFrameHost::new(&config).context("Failed to set up frame loader")?),
    downloads: Arc::new(downloads),
    clipboard: Arc::new(SystemClipboard::spawn()?),
  };

  if args.headless {
    return run_headless(&host, args.json).await;
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, App::new(host.clone(), address_bar)).await;
  ratatui::restore();

  let pending = host.downloads.in_flight();
  if pending > 0 {
    eprintln!("Waiting for {} download(s) to finish...", pending);
    host.downloads.settle().await;
  }
  result
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  // Scan as soon as the window opens, like a popup would.
  app.trigger_scan();
  let poll = Duration::from_millis(constants().poll_interval_ms);

  loop {
    app.check_pending().await;

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(poll)? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  Ok(())
}

/// One scan without the TUI. Statuses go to stderr in JSON mode so stdout stays parseable.
async fn run_headless(host: &Host, json: bool) -> Result<()> {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let scan = {
    let host = host.clone();
    tokio::spawn(async move { run_scan(&host, &tx).await })
  };

  while let Some(event) = rx.recv().await {
    match event {
      WorkflowEvent::Status(status) if json => eprintln!("{}", status),
      WorkflowEvent::Status(status) => println!("{}", status),
      WorkflowEvent::Render(entries) if json => {
        for (entry, view) in entries.iter().zip(entry_views(&entries)) {
          let line = serde_json::json!({ "url": entry.url, "frameUrl": entry.frame_url, "type": view.pill });
          println!("{}", line);
        }
      }
      WorkflowEvent::Render(entries) => {
        for view in entry_views(&entries) {
          println!("  {}\n    {}  [{}]", view.link, view.frame, view.pill);
        }
      }
    }
  }

  scan.await.context("Scan task failed")?;
  host.downloads.settle().await;
  Ok(())
}
