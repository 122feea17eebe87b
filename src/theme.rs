use ratatui::style::Color;

pub struct Theme {
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
  /// Background of the host "pill" on result cards.
  pub pill_bg: Color,
}

pub const THEME: Theme = Theme {
  bg: Color::Rgb(24, 24, 32),
  fg: Color::Rgb(220, 220, 230),
  accent: Color::Rgb(122, 162, 247),
  muted: Color::Rgb(120, 124, 150),
  border: Color::Rgb(65, 72, 104),
  status: Color::Rgb(224, 175, 104),
  error: Color::Rgb(247, 118, 142),
  highlight_fg: Color::Rgb(24, 24, 32),
  highlight_bg: Color::Rgb(122, 162, 247),
  stripe_bg: Color::Rgb(30, 31, 42),
  key_fg: Color::Rgb(24, 24, 32),
  key_bg: Color::Rgb(120, 124, 150),
  pill_bg: Color::Rgb(52, 59, 88),
};
