pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use renderfns::{draw_footer, draw_header};
use view::ShortcutInfo;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let location = app.location().to_string();
  let fetching = app.is_fetching();
  let mut shortcuts = vec![ShortcutInfo::new(":", "command").with_priority(10)];
  if let Some(view) = app.current_view() {
    shortcuts.extend(view.shortcuts());
  }
  draw_header(frame, chunks[0], app.title(), &location, fetching, &shortcuts);

  app.render_view(frame, chunks[1]);

  // Command palette draws over the view
  app.command_input().render_overlay(frame, chunks[1]);

  draw_footer(frame, chunks[2], &app.breadcrumb(), app.status_message());
}

/// Keep a table selection inside `0..len`, selecting the first row when
/// there is data and nothing is selected.
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}
