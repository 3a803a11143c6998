use std::fmt;
use url::Url;

/// Origin every app location is resolved against
const APP_ORIGIN: &str = "castly://app/";

/// An app-local URL such as `/?page=2&name=Rick` or `/character/7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  url: Url,
}

impl Location {
  /// Parse a path-and-query string, a relative path, or a full
  /// `castly://app/...` URL.
  pub fn parse(input: &str) -> Result<Self, url::ParseError> {
    let url = Url::parse(APP_ORIGIN)?.join(input.trim())?;
    Ok(Self { url })
  }

  /// Build a location from a path and ordered query parameters.
  pub fn from_parts(path: &str, params: &[(&str, &str)]) -> Self {
    let mut url = Self::origin();
    url.set_path(path);
    if !params.is_empty() {
      url.query_pairs_mut().extend_pairs(params);
    }
    Self { url }
  }

  fn origin() -> Url {
    match Url::parse(APP_ORIGIN) {
      Ok(url) => url,
      Err(_) => unreachable!("app origin is a valid URL"),
    }
  }

  /// Non-empty path segments, still percent-encoded
  pub fn segments(&self) -> Vec<&str> {
    self
      .url
      .path_segments()
      .map(|segments| segments.filter(|s| !s.is_empty()).collect())
      .unwrap_or_default()
  }

  /// First value of a decoded query parameter
  pub fn query_param(&self, name: &str) -> Option<String> {
    self
      .url
      .query_pairs()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.into_owned())
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.url.path())?;
    if let Some(query) = self.url.query() {
      write!(f, "?{}", query)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_forms() {
    for input in ["/character/7", "character/7", "castly://app/character/7"] {
      let location = Location::parse(input).unwrap();
      assert_eq!(location.segments(), vec!["character", "7"], "{}", input);
    }
  }

  #[test]
  fn test_empty_is_root() {
    let root = Location::parse("").unwrap();
    assert_eq!(root, Location::parse("/").unwrap());
    assert_eq!(root.to_string(), "/");
  }

  #[test]
  fn test_query_param_is_decoded() {
    let location = Location::parse("/?page=2&name=Rick+Sanchez").unwrap();
    assert_eq!(location.query_param("page").as_deref(), Some("2"));
    assert_eq!(location.query_param("name").as_deref(), Some("Rick Sanchez"));
    assert_eq!(location.query_param("missing"), None);
  }

  #[test]
  fn test_from_parts_encodes() {
    let location = Location::from_parts("/", &[("page", "1"), ("name", "Mr. Poopy & co")]);
    assert_eq!(location.to_string(), "/?page=1&name=Mr.+Poopy+%26+co");
    assert_eq!(
      Location::parse(&location.to_string()).unwrap(),
      location
    );
  }
}
