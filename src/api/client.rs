use crate::api::error::ApiError;
use crate::api::types::{ApiErrorBody, Character, Episode, OneOrMany, Page};
use crate::config::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Character API client wrapper
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
    let base_url = Url::parse(&config.base_url)?;
    if base_url.cannot_be_a_base() {
      return Err(ApiError::InvalidUrl(
        url::ParseError::RelativeUrlWithCannotBeABaseBase,
      ));
    }

    let mut headers = HeaderMap::new();
    headers.insert(
      USER_AGENT,
      HeaderValue::from_static(concat!("castly/", env!("CARGO_PKG_VERSION"))),
    );

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;

    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Get one page of characters, optionally filtered by name
  pub async fn fetch_characters(&self, page: u32, name: Option<&str>) -> Result<Page, ApiError> {
    let mut url = self.endpoint(&["character"])?;
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("page", &page.to_string());
      if let Some(name) = name.filter(|n| !n.is_empty()) {
        query.append_pair("name", name);
      }
    }

    self.get_json(url).await
  }

  /// Get a single character by id
  pub async fn fetch_character(&self, id: u64) -> Result<Character, ApiError> {
    let url = self.endpoint(&["character", &id.to_string()])?;
    self.get_json(url).await
  }

  /// Get a single episode by id
  pub async fn fetch_episode(&self, id: u64) -> Result<Episode, ApiError> {
    let url = self.endpoint(&["episode", &id.to_string()])?;
    self.get_json(url).await
  }

  /// Get several episodes in one batched request.
  ///
  /// Takes episode reference URLs (as found on a character), extracts the
  /// trailing id from each, and asks for all of them with a comma-joined
  /// path segment. A single numeric id goes through [`Self::fetch_episode`].
  /// An empty input never touches the network.
  pub async fn fetch_episodes_by_ids(&self, urls: &[String]) -> Result<Vec<Episode>, ApiError> {
    let ids: Vec<&str> = urls
      .iter()
      .map(|url| episode_id(url))
      .filter(|id| !id.is_empty())
      .collect();

    if ids.is_empty() {
      return Ok(Vec::new());
    }
    if let [id] = ids.as_slice() {
      if let Ok(id) = id.parse::<u64>() {
        return Ok(vec![self.fetch_episode(id).await?]);
      }
    }

    let url = self.endpoint(&["episode", &ids.join(",")])?;
    let episodes: OneOrMany<Episode> = self.get_json(url).await?;

    Ok(episodes.into_vec())
  }

  /// Build an endpoint URL below the configured base
  fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
    debug!(method = "GET", %url, "request");

    let response = self.http.get(url.clone()).send().await.map_err(|e| {
      warn!(%url, error = %e, "request failed");
      ApiError::Network(e)
    })?;

    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
      let detail = serde_json::from_slice::<ApiErrorBody>(&body)
        .ok()
        .map(|b| b.error);
      warn!(%url, status = status.as_u16(), ?detail, "non-success response");
      return Err(ApiError::http(status.as_u16(), detail));
    }

    serde_json::from_slice(&body).map_err(|e| {
      warn!(%url, error = %e, "failed to decode response");
      ApiError::Parse(e)
    })
  }
}

/// Extract the trailing id from an episode reference URL
fn episode_id(url: &str) -> &str {
  let trimmed = url.trim_end_matches('/');
  trimmed.rsplit('/').next().unwrap_or(trimmed)
}
