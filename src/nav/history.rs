use super::state::NavState;

/// Back stack of visited locations.
///
/// Never empty: the bottom entry is where the session started.
#[derive(Debug, Clone)]
pub struct History {
  entries: Vec<NavState>,
}

impl History {
  pub fn new(start: NavState) -> Self {
    Self {
      entries: vec![start],
    }
  }

  pub fn current(&self) -> &NavState {
    // entries is never empty
    &self.entries[self.entries.len() - 1]
  }

  /// Push `state` unless it is already current. Returns whether it was pushed.
  pub fn push(&mut self, state: NavState) -> bool {
    if *self.current() == state {
      return false;
    }
    self.entries.push(state);
    true
  }

  /// Replace the current entry without growing the stack
  pub fn replace(&mut self, state: NavState) {
    let last = self.entries.len() - 1;
    self.entries[last] = state;
  }

  /// Step back to the previous entry, if there is one.
  pub fn back(&mut self) -> Option<&NavState> {
    if !self.can_go_back() {
      return None;
    }
    self.entries.pop();
    Some(self.current())
  }

  pub fn can_go_back(&self) -> bool {
    self.entries.len() > 1
  }
}
