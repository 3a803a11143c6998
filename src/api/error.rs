use thiserror::Error;

/// Errors raised by the API gateway.
///
/// Every failure is scoped to the query that produced it; none of these are
/// fatal to the app.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Upstream answered with a non-2xx status
  #[error("{message}")]
  Http { status: u16, message: String },

  /// The request could not complete (DNS, connect, timeout, body read)
  #[error("Network error: {0}")]
  Network(#[from] reqwest::Error),

  /// The response body did not match the expected shape
  #[error("Unexpected response: {0}")]
  Parse(#[from] serde_json::Error),

  /// A route parameter that should be numeric was not
  #[error("Invalid id: {0:?}")]
  InvalidId(String),

  #[error("Invalid URL: {0}")]
  InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
  pub fn http(status: u16, detail: Option<String>) -> Self {
    let message = match detail {
      Some(detail) if !detail.is_empty() => format!("HTTP error! status: {} ({})", status, detail),
      _ => format!("HTTP error! status: {}", status),
    };
    ApiError::Http { status, message }
  }

  /// HTTP status code, if the failure came from an upstream response
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Http { status, .. } => Some(*status),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_http_message() {
    let err = ApiError::http(500, None);
    assert_eq!(err.to_string(), "HTTP error! status: 500");
    assert_eq!(err.status(), Some(500));
  }

  #[test]
  fn test_http_message_with_detail() {
    let err = ApiError::http(404, Some("There is nothing here".to_string()));
    assert_eq!(
      err.to_string(),
      "HTTP error! status: 404 (There is nothing here)"
    );
  }

  #[test]
  fn test_invalid_id_has_no_status() {
    assert_eq!(ApiError::InvalidId("abc".to_string()).status(), None);
  }
}
