use crate::cache::QueryOptions;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the API base URL
pub const BASE_URL_ENV: &str = "CASTLY_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub query: QueryConfig,
  /// Custom title for header (defaults to "castly")
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request timeout
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_secs: 20,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
  /// How long fetched data is served without a refetch
  pub stale_time_secs: u64,
  /// Automatic retries after a failed request
  pub retry: u32,
  pub retry_delay_ms: u64,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: 5 * 60,
      retry: 1,
      retry_delay_ms: 1000,
    }
  }
}

impl QueryConfig {
  /// Cache options for queries built from this configuration
  pub fn options(&self) -> QueryOptions {
    QueryOptions::default()
      .with_stale_time(Duration::from_secs(self.stale_time_secs))
      .with_retry(self.retry)
      .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./castly.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/castly/config.yaml
  ///
  /// No file at all is fine; every key has a default. The
  /// `CASTLY_BASE_URL` environment variable is applied on top.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    Ok(config.with_env_override(std::env::var(BASE_URL_ENV).ok()))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("castly.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("castly").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null, which means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  fn with_env_override(self, base_url: Option<String>) -> Self {
    match base_url.filter(|url| !url.trim().is_empty()) {
      Some(url) => self.with_base_url(url),
      None => self,
    }
  }

  /// Replace the API base URL (used for the `--base-url` flag)
  pub fn with_base_url(mut self, base_url: String) -> Self {
    self.api.base_url = base_url;
    self
  }

  /// Header title
  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("castly")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.timeout_secs, 20);
    assert_eq!(config.title(), "castly");

    let options = config.query.options();
    assert_eq!(options.stale_time, Duration::from_secs(300));
    assert_eq!(options.retry, 1);
    assert_eq!(options.retry_delay, Duration::from_secs(1));
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config = Config::parse(
      "api:\n  base_url: http://localhost:8080/api\nquery:\n  retry: 3\ntitle: cast.ly\n",
    )
    .unwrap();

    assert_eq!(config.api.base_url, "http://localhost:8080/api");
    assert_eq!(config.api.timeout_secs, 20);
    assert_eq!(config.query.retry, 3);
    assert_eq!(config.query.stale_time_secs, 300);
    assert_eq!(config.title(), "cast.ly");
  }

  #[test]
  fn test_empty_file_is_default() {
    let config = Config::parse("  \n").unwrap();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
  }

  #[test]
  fn test_invalid_yaml_fails() {
    assert!(Config::parse("query:\n  retry: many\n").is_err());
  }

  #[test]
  fn test_env_override() {
    let config = Config::default().with_env_override(Some("http://mirror/api".to_string()));
    assert_eq!(config.api.base_url, "http://mirror/api");

    let config = Config::default().with_env_override(Some("  ".to_string()));
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);

    let config = Config::default().with_env_override(None);
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
  }

  #[test]
  fn test_flag_wins_over_env() {
    let config = Config::default()
      .with_env_override(Some("http://env/api".to_string()))
      .with_base_url("http://flag/api".to_string());
    assert_eq!(config.api.base_url, "http://flag/api");
  }

  #[test]
  fn test_missing_explicit_path_fails() {
    let result = Config::load(Some(Path::new("/definitely/not/here/castly.yaml")));
    assert!(result.is_err());
  }
}
