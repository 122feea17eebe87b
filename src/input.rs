use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  // Ctrl+R rescans from either mode
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
    app.trigger_scan();
    return;
  }

  match app.mode {
    AppMode::Address => handle_address_key(app, key),
    AppMode::Results => handle_results_key(app, key),
  }
}

fn handle_address_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.trigger_scan();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.entries.is_empty() {
        app.mode = AppMode::Results;
      } else if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      if !app.entries.is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
    KeyCode::Char('c') | KeyCode::Char('y') => app.copy_selected(),
    KeyCode::Char('d') => app.download_selected(),
    KeyCode::Char('o') | KeyCode::Enter => app.open_selected(),
    KeyCode::Char('r') => app.trigger_scan(),
    KeyCode::Char('q') => app.should_quit = true,
    KeyCode::Esc | KeyCode::Tab | KeyCode::Char('/') => {
      app.mode = AppMode::Address;
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::collector::VideoEntry;
  use crate::host::fakes::{StaticFrames, StaticTab, host};
  use crate::web::AddressBar;
  use crate::workflow::WorkflowEvent;
  use ratatui::crossterm::event::KeyEvent;
  use std::sync::Arc;

  fn app() -> App {
    let (host, _, _) = host(StaticTab(None), StaticFrames::default());
    App::new(host, Arc::new(AddressBar::default()))
  }

  fn press(app: &mut App, code: KeyCode) {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- address editing ---

  #[test]
  fn typing_edits_address_at_cursor() {
    let mut app = app();
    for c in "exmple.test".chars() {
      press(&mut app, KeyCode::Char(c));
    }
    press(&mut app, KeyCode::Home);
    for _ in 0..2 {
      press(&mut app, KeyCode::Right);
    }
    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.input, "example.test");

    press(&mut app, KeyCode::End);
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.input, "example.tes");
    assert_eq!(app.cursor_position, 11);
  }

  #[test]
  fn escape_on_empty_address_quits() {
    let mut app = app();
    press(&mut app, KeyCode::Char('x'));
    press(&mut app, KeyCode::Esc);
    assert!(app.input.is_empty());
    assert!(!app.should_quit);
    press(&mut app, KeyCode::Esc);
    assert!(app.should_quit);
  }

  #[test]
  fn ctrl_c_quits_from_results() {
    let mut app = app();
    app.mode = AppMode::Results;
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  // --- results navigation ---

  #[test]
  fn results_keys_move_and_switch_modes() {
    let mut app = app();
    let entry = |u: &str| VideoEntry { url: u.to_string(), frame_url: String::new() };
    app.apply(WorkflowEvent::Render(vec![entry("https://a.test/1.mp4"), entry("https://a.test/2.mp4")]));
    assert_eq!(app.mode, AppMode::Results);

    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.selected_entry().map(|e| e.url.as_str()), Some("https://a.test/2.mp4"));
    press(&mut app, KeyCode::Char('k'));
    assert_eq!(app.list_state.selected(), Some(0));

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, AppMode::Address);
    press(&mut app, KeyCode::Down);
    assert_eq!(app.mode, AppMode::Results);
  }
}
