use super::location::Location;
use std::fmt;

/// Navigation state derived from the current location.
///
/// The location is the source of truth; this is a projection that can be
/// rebuilt from it at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
  /// Current list page, always at least 1
  pub page: u32,
  /// Name filter for the list, never empty
  pub name: Option<String>,
  /// Character shown in the detail view, kept as it appeared in the path
  pub selected_id: Option<String>,
}

impl Default for NavState {
  fn default() -> Self {
    Self::list(1, None)
  }
}

impl NavState {
  pub fn list(page: u32, name: Option<&str>) -> Self {
    Self {
      page: page.max(1),
      name: name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from),
      selected_id: None,
    }
  }

  pub fn character(id: impl Into<String>) -> Self {
    Self {
      page: 1,
      name: None,
      selected_id: Some(id.into()),
    }
  }

  /// Parse an app URL straight into state
  pub fn parse(input: &str) -> Result<Self, url::ParseError> {
    Location::parse(input).map(|location| Self::from_location(&location))
  }

  /// Derive state from a location. Unknown paths route to the list.
  pub fn from_location(location: &Location) -> Self {
    if let ["character", id] = location.segments().as_slice() {
      return Self::character(*id);
    }

    let page = location
      .query_param("page")
      .and_then(|p| p.trim().parse::<u32>().ok())
      .unwrap_or(1);
    let name = location.query_param("name");

    Self::list(page, name.as_deref())
  }

  pub fn to_location(&self) -> Location {
    match &self.selected_id {
      Some(id) => Location::from_parts(&format!("/character/{}", id), &[]),
      None => {
        let page = self.page.to_string();
        let mut params = vec![("page", page.as_str())];
        if let Some(name) = &self.name {
          params.push(("name", name.as_str()));
        }
        Location::from_parts("/", &params)
      }
    }
  }

  pub fn is_detail(&self) -> bool {
    self.selected_id.is_some()
  }

  /// Start a new search from page 1. A blank term clears the filter.
  pub fn submit_search(&self, term: &str) -> Self {
    Self::list(1, Some(term))
  }

  /// Move to another page, keeping the current filter
  pub fn change_page(&self, page: u32) -> Self {
    Self::list(page, self.name.as_deref())
  }

  /// Open the detail view for a character
  pub fn select(&self, id: impl Into<String>) -> Self {
    Self::character(id)
  }
}

impl fmt::Display for NavState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.to_location(), f)
  }
}
