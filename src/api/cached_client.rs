//! API client paired with process-wide request caches.
//!
//! Each view builds its own [`Query`] observers from here; all of them share
//! one cache per resource, so two screens asking for the same key share one
//! request and one result.

use super::client::ApiClient;
use super::error::ApiError;
use super::keys::{CharacterKey, CharactersKey, EpisodesKey};
use super::types::{Character, Episode, Page};
use crate::cache::{QueryCache, QueryOptions};
use crate::config::Config;
use crate::query::Query;
use url::Url;

pub type CharactersQuery = Query<CharactersKey, Page, ApiError>;
pub type CharacterQuery = Query<CharacterKey, Character, ApiError>;
pub type EpisodesQuery = Query<EpisodesKey, Vec<Episode>, ApiError>;

/// API client with transparent caching support.
#[derive(Clone)]
pub struct CachedApiClient {
  inner: ApiClient,
  pages: QueryCache<CharactersKey, Page, ApiError>,
  characters: QueryCache<CharacterKey, Character, ApiError>,
  episodes: QueryCache<EpisodesKey, Vec<Episode>, ApiError>,
  options: QueryOptions,
}

impl CachedApiClient {
  pub fn new(config: &Config) -> Result<Self, ApiError> {
    Ok(Self::with_client(
      ApiClient::new(&config.api)?,
      config.query.options(),
    ))
  }

  pub fn with_client(inner: ApiClient, options: QueryOptions) -> Self {
    Self {
      inner,
      pages: QueryCache::new(),
      characters: QueryCache::new(),
      episodes: QueryCache::new(),
      options,
    }
  }

  pub fn base_url(&self) -> &Url {
    self.inner.base_url()
  }

  /// Observer for character list pages. Keeps the previous page visible
  /// while the next one loads.
  pub fn characters_query(&self) -> CharactersQuery {
    let api = self.inner.clone();
    Query::new(
      self.pages.clone(),
      self.options.clone().keep_previous_data(true),
      move |key: &CharactersKey| {
        let api = api.clone();
        let key = key.clone();
        async move { api.fetch_characters(key.page, key.name.as_deref()).await }
      },
    )
  }

  /// Observer for a single character
  pub fn character_query(&self) -> CharacterQuery {
    let api = self.inner.clone();
    Query::new(
      self.characters.clone(),
      self.options.clone(),
      move |key: &CharacterKey| {
        let api = api.clone();
        let id = key.id.clone();
        async move { api.fetch_character(parse_id(&id)?).await }
      },
    )
  }

  /// Observer for a character's episodes. Starts disabled; enable it once
  /// the character is known.
  pub fn episodes_query(&self) -> EpisodesQuery {
    let api = self.inner.clone();
    Query::new(
      self.episodes.clone(),
      self.options.clone(),
      move |key: &EpisodesKey| {
        let api = api.clone();
        let urls = key.urls.clone();
        async move { api.fetch_episodes_by_ids(&urls).await }
      },
    )
    .disabled()
  }
}

/// Route ids are strings; the API wants a number
fn parse_id(id: &str) -> Result<u64, ApiError> {
  id.trim()
    .parse()
    .map_err(|_| ApiError::InvalidId(id.to_string()))
}
