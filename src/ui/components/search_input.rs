use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Enter pressed with this term (may be empty)
  Submitted(String),
  /// Escape pressed; the current filter stays as it was
  Cancelled,
}

/// Search prompt component with activation/deactivation
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if search is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Activate search mode, pre-filled with the current filter
  pub fn activate_with(&mut self, initial: &str) {
    self.active = true;
    self.input.set_value(initial);
  }

  /// Handle a key event.
  ///
  /// Call this regardless of active state; `/` activates the prompt with
  /// `current` as its starting text.
  pub fn handle_key(&mut self, key: KeyEvent, current: &str) -> KeyResult<SearchEvent> {
    // If not active, check for activation key
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate_with(current);
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    // Active - delegate to TextInput; swallow everything else while typing
    match self.input.handle_key(key) {
      InputResult::Submitted(term) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted(term))
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(SearchEvent::Cancelled)
      }
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = 3u16.min(area.height); // Just input line with borders

    // Position at top-left of content area with small margin
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search by name ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let (before, after) = self.input.split_at_cursor();
    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_slash_activates_with_current_filter() {
    let mut search = SearchInput::new();
    assert_eq!(search.handle_key(key(KeyCode::Char('j')), ""), KeyResult::NotHandled);

    assert_eq!(search.handle_key(key(KeyCode::Char('/')), "Rick"), KeyResult::Handled);
    assert!(search.is_active());
    assert_eq!(search.input.value(), "Rick");
  }

  #[test]
  fn test_submit_emits_term() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')), "");
    for c in "Morty".chars() {
      search.handle_key(key(KeyCode::Char(c)), "");
    }

    assert_eq!(
      search.handle_key(key(KeyCode::Enter), ""),
      KeyResult::Event(SearchEvent::Submitted("Morty".to_string()))
    );
    assert!(!search.is_active());
  }

  #[test]
  fn test_cancel() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')), "Rick");
    assert_eq!(
      search.handle_key(key(KeyCode::Esc), ""),
      KeyResult::Event(SearchEvent::Cancelled)
    );
    assert!(!search.is_active());
  }

  #[test]
  fn test_active_prompt_swallows_keys() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')), "");
    assert_eq!(search.handle_key(key(KeyCode::Tab), ""), KeyResult::Handled);
  }
}
