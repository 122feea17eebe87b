use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, List, ListItem, Padding, Paragraph},
};

use crate::app::{App, AppMode};
use crate::presenter::entry_views;
use crate::theme::{THEME, Theme};
use crate::workflow::COULD_NOT_SCAN;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = &THEME;

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, theme, header_area);
  render_main(frame, app, theme, main_area);
  render_status(frame, app, theme, status_area);
  render_input(frame, app, theme, input_area);
  render_footer(frame, app, theme, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▼ vidsweep ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let in_flight = app.downloads_in_flight();
  let mut right = String::new();
  if in_flight > 0 {
    right.push_str(&format!("↓ {}  ", in_flight));
  }
  right.push_str(&format!("v{} ", env!("CARGO_PKG_VERSION")));
  let width = (right.chars().count() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width, ..area };
  frame.render_widget(Line::from(Span::styled(right, Style::default().fg(theme.muted))), right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
  if app.entries.is_empty() {
    render_welcome(frame, theme, area);
  } else {
    render_results(frame, app, theme, area);
  }
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▼  vidsweep", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Find every video on a page and its frames. Save them.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a page address below and press Enter.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered()
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();

  let items: Vec<ListItem> = entry_views(&app.entries)
    .into_iter()
    .enumerate()
    .map(|(i, view)| {
      let bg = if Some(i) == selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };
      let fg = if Some(i) == selected { theme.highlight_fg } else { theme.fg };

      let pill = format!(" {} ", view.pill);
      let pill_w = pill.chars().count();
      let frame_label = truncate_str(&view.frame, inner_w.saturating_sub(pill_w + 2));
      let gap = inner_w.saturating_sub(frame_label.chars().count() + pill_w);

      let lines = vec![
        Line::from(Span::styled(
          truncate_str(&view.link, inner_w),
          Style::default().fg(fg).add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(vec![
          Span::styled(frame_label, Style::default().fg(theme.muted)),
          Span::raw(" ".repeat(gap)),
          Span::styled(pill, Style::default().fg(theme.fg).bg(theme.pill_bg)),
        ]),
      ];
      ListItem::new(lines).bg(bg)
    })
    .collect();

  let title = format!(" Videos ({}) ", app.entries.len());
  let border_color = if app.mode == AppMode::Results { theme.accent } else { theme.border };
  let list = List::new(items)
    .block(
      Block::bordered()
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(border_color)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_status(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
  let (text, style) = if app.is_scanning() {
    (format!(" ⏳ {}", app.status), Style::default().fg(theme.status))
  } else if app.status == COULD_NOT_SCAN {
    (format!(" ⚠  {}", app.status), Style::default().fg(theme.error))
  } else {
    (format!(" {}", app.status), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
  let border_color = if app.mode == AppMode::Address { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Page address ")
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  // No room for a cursor inside the borders on very narrow terminals.
  if app.mode == AppMode::Address && inner_w > 0 {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
  let scanning = app.is_scanning();
  let scan_label = if scanning { "Scanning…" } else { "Scan" };
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Address => {
      let mut k = vec![("Enter", scan_label)];
      if app.entries.is_empty() {
        k.push(("Esc", "Quit"));
      } else {
        k.push(("↓", "Videos"));
      }
      k
    }
    AppMode::Results => vec![
      ("j/k", "Navigate"),
      ("c", "Copy"),
      ("d", "Download"),
      ("o", "Open"),
      ("r", scan_label),
      ("Esc", "Address"),
    ],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let disabled = scanning && (*action == scan_label);
      let key_style = if disabled {
        Style::default().fg(theme.muted).bg(theme.stripe_bg)
      } else {
        Style::default().fg(theme.key_fg).bg(theme.key_bg)
      };
      let mut s = vec![
        Span::styled(format!(" {} ", key), key_style),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);
}
