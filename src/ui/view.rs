use crate::nav::NavState;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Go to a new location, recorded in history
  Navigate(NavState),
  /// Return to the previous location
  Back,
  /// Exit the app
  Quit,
}

/// Trait for view behavior
///
/// Views never change the location themselves. They translate keys into
/// actions; the App records the new location in history and hands the
/// resulting state back through `sync()`. This creates a clean delegation
/// chain: App → View → Components
///
/// Views that load data asynchronously use Query internally and poll it in
/// the tick() method.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Show `state`. Returns false if this view cannot display it, in which
  /// case the App tries the view below or opens a new one.
  fn sync(&mut self, state: &NavState) -> bool;

  /// Called on each tick to allow views to poll async queries.
  /// Returns true if anything changed.
  fn tick(&mut self) -> bool {
    false
  }

  /// Refetch whatever the view is showing
  fn refresh(&mut self) {}

  /// True while any of the view's requests is pending
  fn is_fetching(&self) -> bool {
    false
  }

  /// True while the view owns the keyboard (e.g. a search prompt is open)
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("q", "back").with_priority(30)]
  }
}
