//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Trait for keys that identify a cached request.
///
/// Two keys that compare equal share one cache entry. Changing any
/// parameter must produce an unequal key.
pub trait QueryKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
  /// Logical resource name (e.g., "characters", "episodes")
  fn resource(&self) -> &'static str;

  /// Human-readable description for logs
  fn description(&self) -> String;
}

/// Outcome of a fetch as seen by every waiter that joined it.
pub type FetchResult<T, E> = Result<Arc<T>, Arc<E>>;

/// Lifecycle of a single cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
  /// Nothing has been requested for this key
  #[default]
  Idle,
  /// A fetch is in flight and no result has been recorded yet
  Loading,
  /// The last fetch succeeded
  Success,
  /// The last fetch failed after exhausting retries
  Error,
}

/// A single cached entry.
///
/// `data` is never mutated in place; a successful refetch swaps in a new `Arc`.
#[derive(Debug)]
pub struct CacheEntry<T, E> {
  pub status: QueryStatus,
  pub data: Option<Arc<T>>,
  pub error: Option<Arc<E>>,
  /// When `data` was last replaced by a successful fetch
  pub updated_at: Option<DateTime<Utc>>,
}

impl<T, E> Default for CacheEntry<T, E> {
  fn default() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      updated_at: None,
    }
  }
}

impl<T, E> Clone for CacheEntry<T, E> {
  fn clone(&self) -> Self {
    Self {
      status: self.status,
      data: self.data.clone(),
      error: self.error.clone(),
      updated_at: self.updated_at,
    }
  }
}

impl<T, E> CacheEntry<T, E> {
  /// Check whether the data is younger than `stale_time`.
  pub fn is_fresh(&self, stale_time: std::time::Duration) -> bool {
    match (&self.data, self.updated_at) {
      (Some(_), Some(updated_at)) => (Utc::now() - updated_at)
        .to_std()
        // A negative age means clock skew; treat it as fresh
        .map(|age| age <= stale_time)
        .unwrap_or(true),
      _ => false,
    }
  }
}
