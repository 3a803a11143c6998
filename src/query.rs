//! Async query abstraction for data fetching with caching support.
//!
//! Inspired by TanStack Query, this module provides a `Query<K, T, E>` type
//! that observes one key at a time in a shared [`QueryCache`], tracks
//! loading/fetching/error state, and keeps the previous key's data on screen
//! while a new key loads.
//!
//! # Example
//!
//! ```ignore
//! let mut query = Query::new(cache, options, move |key: &CharactersKey| {
//!     let api = api.clone();
//!     let key = key.clone();
//!     async move { api.fetch_characters(key.page, key.name.as_deref()).await }
//! });
//!
//! // Observe a key; starts fetching unless the cache is fresh
//! query.set_key(CharactersKey::new(1, None));
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! if query.is_loading() {
//!     render_spinner();
//! } else if let Some(e) = query.error() {
//!     render_error(e);
//! } else if let Some(data) = query.data() {
//!     render_data(data, query.is_placeholder());
//! }
//! ```

use crate::cache::{FetchResult, QueryCache, QueryKey, QueryOptions};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// The state of a query for its current key
#[derive(Debug)]
pub enum QueryState<T, E> {
  /// No key yet, or the query is disabled
  Idle,
  /// Waiting for the first result for this key
  Loading,
  /// The current key resolved successfully
  Success(Arc<T>),
  /// The current key failed after exhausting retries
  Error(Arc<E>),
}

impl<T, E> QueryState<T, E> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }
}

/// A factory that creates futures for fetching a key
type FetcherFn<K, T, E> = Arc<dyn Fn(&K) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Async query for data fetching with state management.
///
/// Query encapsulates:
/// - The fetching logic (via a closure over the key)
/// - Loading/fetching/success/error states for the observed key
/// - Async result handling via channels, drained in `poll()`
/// - Placeholder data from the previously observed key
pub struct Query<K, T, E> {
  cache: QueryCache<K, T, E>,
  fetcher: FetcherFn<K, T, E>,
  options: QueryOptions,
  key: Option<K>,
  enabled: bool,
  state: QueryState<T, E>,
  /// Last data that was on screen, for any key
  placeholder: Option<Arc<T>>,
  fetching: bool,
  sender: mpsc::UnboundedSender<(K, FetchResult<T, E>)>,
  receiver: mpsc::UnboundedReceiver<(K, FetchResult<T, E>)>,
}

impl<K, T, E> Query<K, T, E>
where
  K: QueryKey,
  T: Send + Sync + 'static,
  E: fmt::Display + Send + Sync + 'static,
{
  /// Create a new query over `cache` with the given fetcher.
  ///
  /// The fetcher is called with the observed key each time the cache
  /// decides a network round-trip is needed.
  pub fn new<F, Fut>(cache: QueryCache<K, T, E>, options: QueryOptions, fetcher: F) -> Self
  where
    F: Fn(&K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      cache,
      fetcher: Arc::new(move |key: &K| fetcher(key).boxed()),
      options,
      key: None,
      enabled: true,
      state: QueryState::Idle,
      placeholder: None,
      fetching: false,
      sender,
      receiver,
    }
  }

  /// Start disabled; no request is issued until `set_enabled(true)`.
  pub fn disabled(mut self) -> Self {
    self.enabled = false;
    self
  }

  /// The key currently observed
  pub fn key(&self) -> Option<&K> {
    self.key.as_ref()
  }

  /// Data to display: the current key's result, or the previous key's
  /// data while the current key is still loading.
  pub fn data(&self) -> Option<&T> {
    match &self.state {
      QueryState::Success(data) => Some(&**data),
      QueryState::Loading => self.placeholder.as_deref(),
      _ => None,
    }
  }

  /// True when the displayed data belongs to a previous key
  pub fn is_placeholder(&self) -> bool {
    self.state.is_loading() && self.placeholder.is_some()
  }

  /// True only when there is nothing at all to show yet.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading() && self.placeholder.is_none()
  }

  /// True whenever a request for the current key is pending
  pub fn is_fetching(&self) -> bool {
    self.fetching
  }

  /// Get the error if the current key failed.
  pub fn error(&self) -> Option<&E> {
    match &self.state {
      QueryState::Error(e) => Some(&**e),
      _ => None,
    }
  }

  /// When the current key's data was last fetched
  pub fn updated_at(&self) -> Option<DateTime<Utc>> {
    let key = self.key.as_ref()?;
    self.cache.get(key).and_then(|entry| entry.updated_at)
  }

  /// Observe `key`. A no-op when it is already the current key.
  pub fn set_key(&mut self, key: K) {
    if self.key.as_ref() == Some(&key) {
      return;
    }

    debug!(query = %key.description(), "observing");
    self.key = Some(key);
    self.fetching = false;
    self.state = QueryState::Idle;
    if !self.options.keep_previous_data {
      self.placeholder = None;
    }

    self.load();
  }

  /// Gate the query. Enabling a query with a key starts loading it.
  pub fn set_enabled(&mut self, enabled: bool) {
    if self.enabled == enabled {
      return;
    }
    self.enabled = enabled;
    if enabled && matches!(self.state, QueryState::Idle) {
      self.load();
    }
  }

  /// Force a refetch of the current key, whatever its freshness.
  ///
  /// Joins a request that is already in flight for the key.
  pub fn refetch(&mut self) {
    if self.key.is_none() || !self.enabled {
      return;
    }
    if matches!(self.state, QueryState::Error(_) | QueryState::Idle) {
      self.state = QueryState::Loading;
    }
    self.start_fetch(true);
  }

  /// Poll for results from pending fetches.
  ///
  /// Returns `true` if the state changed. Results for a key other than the
  /// one currently observed are dropped.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Ok((key, result)) = self.receiver.try_recv() {
      if self.key.as_ref() != Some(&key) {
        debug!(query = %key.description(), "dropping response for superseded key");
        continue;
      }

      self.fetching = false;
      match result {
        Ok(data) => self.show(data),
        Err(error) => self.state = QueryState::Error(error),
      }
      changed = true;
    }

    changed
  }

  /// Show cached data for the current key, revalidating in the background
  /// when it is stale, or start loading when there is none.
  fn load(&mut self) {
    let Some(key) = self.key.as_ref() else {
      return;
    };
    if !self.enabled {
      return;
    }

    match self.cache.get(key) {
      Some(entry) if entry.data.is_some() => {
        let fresh = entry.is_fresh(self.options.stale_time);
        if let Some(data) = entry.data {
          self.show(data);
        }
        if !fresh {
          self.start_fetch(false);
        }
      }
      _ => {
        self.state = QueryState::Loading;
        self.start_fetch(false);
      }
    }
  }

  fn show(&mut self, data: Arc<T>) {
    self.placeholder = Some(Arc::clone(&data));
    self.state = QueryState::Success(data);
  }

  fn start_fetch(&mut self, force: bool) {
    let Some(key) = self.key.clone() else {
      return;
    };

    let fetcher = Arc::clone(&self.fetcher);
    let fetch_key = key.clone();
    let future = self
      .cache
      .fetch(key.clone(), move || fetcher(&fetch_key), &self.options, force);

    self.fetching = true;
    let tx = self.sender.clone();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - the query may have been dropped
      let _ = tx.send((key, result));
    });
  }
}

// Query is not Clone because the receiver is owned.
// Share the underlying QueryCache instead.

impl<K: fmt::Debug, T: fmt::Debug, E: fmt::Debug> fmt::Debug for Query<K, T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("state", &self.state)
      .field("enabled", &self.enabled)
      .field("fetching", &self.fetching)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  #[derive(Debug, Clone, PartialEq, Eq, Hash)]
  struct PageKey(u32);

  impl QueryKey for PageKey {
    fn resource(&self) -> &'static str {
      "pages"
    }

    fn description(&self) -> String {
      format!("page {}", self.0)
    }
  }

  fn options() -> QueryOptions {
    QueryOptions::default()
      .with_retry_delay(Duration::ZERO)
      .keep_previous_data(true)
  }

  /// Query whose fetcher returns `key * 10` after `delay_for(key)` and counts calls
  fn page_query(
    calls: &Arc<AtomicU32>,
    delay_for: fn(u32) -> u64,
  ) -> Query<PageKey, u32, String> {
    let calls = Arc::clone(calls);
    Query::new(QueryCache::new(), options(), move |key: &PageKey| {
      calls.fetch_add(1, Ordering::SeqCst);
      let page = key.0;
      async move {
        tokio::time::sleep(Duration::from_millis(delay_for(page))).await;
        Ok::<_, String>(page * 10)
      }
    })
  }

  /// Poll until the current key's request settles
  async fn settle(query: &mut Query<PageKey, u32, String>) {
    for _ in 0..200 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      query.poll();
      if !query.is_fetching() {
        return;
      }
    }
    panic!("query did not settle");
  }

  #[tokio::test]
  async fn test_query_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = page_query(&calls, |_| 0);

    assert!(query.key().is_none());
    assert!(!query.is_fetching());

    query.set_key(PageKey(1));
    assert!(query.is_loading());
    assert!(query.is_fetching());

    settle(&mut query).await;
    assert!(query.error().is_none());
    assert_eq!(query.data(), Some(&10));
    assert!(query.updated_at().is_some());
  }

  #[tokio::test]
  async fn test_same_key_twice_is_one_call() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = page_query(&calls, |_| 10);

    query.set_key(PageKey(1));
    query.set_key(PageKey(1));
    settle(&mut query).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_previous_data_kept_while_next_key_loads() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = page_query(&calls, |page| if page == 2 { 50 } else { 0 });

    query.set_key(PageKey(1));
    settle(&mut query).await;

    query.set_key(PageKey(2));
    assert_eq!(query.data(), Some(&10));
    assert!(query.is_placeholder());
    assert!(query.is_fetching());
    assert!(!query.is_loading());

    settle(&mut query).await;
    assert_eq!(query.data(), Some(&20));
    assert!(!query.is_placeholder());
  }

  #[tokio::test]
  async fn test_without_keep_previous_data_clears() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_for_query = Arc::clone(&calls);
    let mut query: Query<PageKey, u32, String> = Query::new(
      QueryCache::new(),
      QueryOptions::default(),
      move |key: &PageKey| {
        calls_for_query.fetch_add(1, Ordering::SeqCst);
        let page = key.0;
        async move { Ok(page) }
      },
    );

    query.set_key(PageKey(1));
    settle(&mut query).await;
    query.set_key(PageKey(2));

    assert!(query.is_loading());
    assert_eq!(query.data(), None);
  }

  #[tokio::test]
  async fn test_superseded_response_is_dropped() {
    let calls = Arc::new(AtomicU32::new(0));
    // Page 2 resolves long after page 3
    let mut query = page_query(&calls, |page| if page == 2 { 80 } else { 0 });

    query.set_key(PageKey(2));
    query.set_key(PageKey(3));
    settle(&mut query).await;
    assert_eq!(query.data(), Some(&30));

    // Let the page 2 response arrive
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!query.poll());
    assert_eq!(query.data(), Some(&30));
    assert_eq!(query.key(), Some(&PageKey(3)));
  }

  #[tokio::test]
  async fn test_revisiting_cached_key_is_instant() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = page_query(&calls, |_| 0);

    query.set_key(PageKey(1));
    settle(&mut query).await;
    query.set_key(PageKey(2));
    settle(&mut query).await;

    query.set_key(PageKey(1));
    assert_eq!(query.data(), Some(&10));
    assert!(!query.is_fetching());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_disabled_query_does_not_fetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = page_query(&calls, |_| 0).disabled();

    query.set_key(PageKey(1));
    tokio::time::sleep(Duration::from_millis(20)).await;
    query.poll();
    assert!(!query.is_loading());
    assert!(!query.is_fetching());
    assert_eq!(query.data(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    query.set_enabled(true);
    settle(&mut query).await;
    assert_eq!(query.data(), Some(&10));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_retry_then_error_then_refetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_for_query = Arc::clone(&calls);
    let mut query: Query<PageKey, u32, String> =
      Query::new(QueryCache::new(), options(), move |_key: &PageKey| {
        let n = calls_for_query.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
          if n <= 2 {
            Err(format!("attempt {} failed", n))
          } else {
            Ok(n)
          }
        }
      });

    query.set_key(PageKey(1));
    settle(&mut query).await;

    // One automatic retry, then the error surfaces
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(query.error().map(String::as_str), Some("attempt 2 failed"));

    query.refetch();
    assert!(query.is_loading());
    settle(&mut query).await;
    assert_eq!(query.data(), Some(&3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_not_loading_after_data_shown() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_for_query = Arc::clone(&calls);
    let mut query: Query<PageKey, u32, String> =
      Query::new(QueryCache::new(), options(), move |key: &PageKey| {
        calls_for_query.fetch_add(1, Ordering::SeqCst);
        let page = key.0;
        async move {
          if page == 2 {
            Err("boom".to_string())
          } else {
            Ok(page)
          }
        }
      });

    query.set_key(PageKey(1));
    settle(&mut query).await;

    query.set_key(PageKey(2));
    assert!(!query.is_loading());
    settle(&mut query).await;
    assert_eq!(query.error().map(String::as_str), Some("boom"));

    query.refetch();
    assert!(!query.is_loading());
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_refetch_forces_new_call() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = page_query(&calls, |_| 0);

    query.set_key(PageKey(1));
    settle(&mut query).await;
    query.refetch();
    assert!(query.is_fetching());
    // Data stays visible during the refetch
    assert_eq!(query.data(), Some(&10));
    settle(&mut query).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
