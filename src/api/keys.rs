//! Query key types for character API calls.

use crate::cache::QueryKey;

/// One page of the character listing, optionally filtered by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharactersKey {
  pub page: u32,
  pub name: Option<String>,
}

impl CharactersKey {
  pub fn new(page: u32, name: Option<&str>) -> Self {
    Self {
      page: page.max(1),
      name: name.filter(|n| !n.is_empty()).map(String::from),
    }
  }
}

impl QueryKey for CharactersKey {
  fn resource(&self) -> &'static str {
    "characters"
  }

  fn description(&self) -> String {
    match &self.name {
      Some(name) => format!("characters page {} matching {:?}", self.page, name),
      None => format!("characters page {}", self.page),
    }
  }
}

/// A single character. The id stays a string here; it is only converted
/// to a number when the request is made.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterKey {
  pub id: String,
}

impl QueryKey for CharacterKey {
  fn resource(&self) -> &'static str {
    "character"
  }

  fn description(&self) -> String {
    format!("character {}", self.id)
  }
}

/// Batch lookup of episodes by their reference URLs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodesKey {
  pub urls: Vec<String>,
}

impl QueryKey for EpisodesKey {
  fn resource(&self) -> &'static str {
    "episodes"
  }

  fn description(&self) -> String {
    format!("{} episodes", self.urls.len())
  }
}
