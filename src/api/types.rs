//! Serde types matching the character API's JSON responses.
//!
//! The API already returns the shapes the views need, so these double as
//! domain types. Values are immutable once fetched and shared through the
//! query cache as `Arc<T>`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterStatus {
  Alive,
  Dead,
  #[serde(rename = "unknown", other)]
  Unknown,
}

impl fmt::Display for CharacterStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      CharacterStatus::Alive => "Alive",
      CharacterStatus::Dead => "Dead",
      CharacterStatus::Unknown => "unknown",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  Female,
  Male,
  Genderless,
  #[serde(rename = "unknown", other)]
  Unknown,
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Gender::Female => "Female",
      Gender::Male => "Male",
      Gender::Genderless => "Genderless",
      Gender::Unknown => "unknown",
    })
  }
}

// ============================================================================
// Characters
// ============================================================================

/// Reference to a location resource (origin or last known location)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
  pub name: String,
  #[serde(default)]
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
  pub id: u64,
  pub name: String,
  pub status: CharacterStatus,
  pub species: String,
  /// Free-text subtype, often empty
  #[serde(rename = "type", default)]
  pub kind: String,
  pub gender: Gender,
  pub origin: LocationRef,
  pub location: LocationRef,
  pub image: String,
  /// Episode reference URLs, in airing order
  #[serde(rename = "episode", default)]
  pub episodes: Vec<String>,
  #[serde(default)]
  pub url: String,
  pub created: String,
}

/// Pagination metadata for a character listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
  pub count: u64,
  pub pages: u32,
  pub next: Option<String>,
  pub prev: Option<String>,
}

impl Info {
  pub fn has_next(&self) -> bool {
    self.next.is_some()
  }

  pub fn has_prev(&self) -> bool {
    self.prev.is_some()
  }
}

/// One page of `GET /character` results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub info: Info,
  #[serde(default)]
  pub results: Vec<Character>,
}

// ============================================================================
// Episodes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
  pub id: u64,
  pub name: String,
  pub air_date: String,
  /// Season/episode code like "S01E01"
  #[serde(rename = "episode")]
  pub code: String,
  #[serde(default)]
  pub characters: Vec<String>,
  #[serde(default)]
  pub url: String,
  pub created: String,
}

/// The batch episode endpoint answers with a bare object when a single id
/// was requested and with an array otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
  Many(Vec<T>),
  One(T),
}

impl<T> OneOrMany<T> {
  pub(crate) fn into_vec(self) -> Vec<T> {
    match self {
      OneOrMany::Many(items) => items,
      OneOrMany::One(item) => vec![item],
    }
  }
}

/// Error body returned alongside non-2xx responses, e.g. `{"error": "There is nothing here"}`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
  pub error: String,
}
