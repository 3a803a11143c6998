use crate::api::CharacterStatus;
use chrono::DateTime;
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for a character's status
pub fn status_color(status: &CharacterStatus) -> Color {
  match status {
    CharacterStatus::Alive => Color::Green,
    CharacterStatus::Dead => Color::Red,
    CharacterStatus::Unknown => Color::DarkGray,
  }
}

/// Render an API timestamp as a calendar date ("November 4, 2017").
///
/// Falls back to the date part of the raw string if it does not parse.
pub fn format_created(created: &str) -> String {
  match DateTime::parse_from_rfc3339(created) {
    Ok(timestamp) => timestamp.format("%B %-d, %Y").to_string(),
    Err(_) => created.split('T').next().unwrap_or(created).to_string(),
  }
}
