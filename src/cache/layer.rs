//! Cache layer that deduplicates fetches and records their outcome per key.

use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{CacheEntry, FetchResult, QueryKey, QueryStatus};

type SharedFetch<T, E> = Shared<BoxFuture<'static, FetchResult<T, E>>>;

/// Per-query behavior knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
  /// How long a successful result is served without refetching
  pub stale_time: Duration,
  /// Automatic retries after a failed attempt
  pub retry: u32,
  /// Pause between attempts
  pub retry_delay: Duration,
  /// Keep showing the previous key's data while a new key loads
  pub keep_previous_data: bool,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_secs(5 * 60),
      retry: 1,
      retry_delay: Duration::from_secs(1),
      keep_previous_data: false,
    }
  }
}

impl QueryOptions {
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn with_retry(mut self, retry: u32) -> Self {
    self.retry = retry;
    self
  }

  pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
    self.retry_delay = retry_delay;
    self
  }

  pub fn keep_previous_data(mut self, keep: bool) -> Self {
    self.keep_previous_data = keep;
    self
  }
}

struct Store<K, T, E> {
  entries: HashMap<K, CacheEntry<T, E>>,
  /// Pending fetches, keyed identically to `entries`
  in_flight: HashMap<K, SharedFetch<T, E>>,
}

/// Process-wide request cache.
///
/// Cloning is cheap; all clones share one store. The lock is only held for
/// map operations, never across an await point.
pub struct QueryCache<K, T, E> {
  store: Arc<Mutex<Store<K, T, E>>>,
}

impl<K, T, E> Clone for QueryCache<K, T, E> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

impl<K, T, E> Default for QueryCache<K, T, E> {
  fn default() -> Self {
    Self {
      store: Arc::new(Mutex::new(Store {
        entries: HashMap::new(),
        in_flight: HashMap::new(),
      })),
    }
  }
}

// The store holds no cross-entry invariants a panic could break
fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, T, E> QueryCache<K, T, E>
where
  K: QueryKey,
  T: Send + Sync + 'static,
  E: fmt::Display + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self::default()
  }

  /// Snapshot of the entry for `key`, if one was ever requested.
  pub fn get(&self, key: &K) -> Option<CacheEntry<T, E>> {
    lock(&self.store).entries.get(key).cloned()
  }

  /// Fetch `key`, consulting the cache and in-flight registry first.
  ///
  /// 1. Fresh data (and `force == false`) resolves immediately
  /// 2. A pending fetch for the same key is joined, never duplicated
  /// 3. Otherwise `fetcher` runs, retrying up to `options.retry` times
  ///
  /// Registration happens before this returns, so two back-to-back calls
  /// share one request even if neither future has been polled yet.
  pub fn fetch<F, Fut>(
    &self,
    key: K,
    fetcher: F,
    options: &QueryOptions,
    force: bool,
  ) -> BoxFuture<'static, FetchResult<T, E>>
  where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let mut store = lock(&self.store);

    if !force {
      if let Some(entry) = store.entries.get(&key) {
        if entry.is_fresh(options.stale_time) {
          if let Some(data) = entry.data.clone() {
            debug!(query = %key.description(), "cache hit");
            return future::ready(Ok(data)).boxed();
          }
        }
      }
    }

    if let Some(pending) = store.in_flight.get(&key) {
      debug!(query = %key.description(), "joining in-flight fetch");
      return pending.clone().boxed();
    }

    debug!(resource = key.resource(), query = %key.description(), force, "fetching");
    let shared = self.run(key.clone(), fetcher, options.clone()).shared();
    store.in_flight.insert(key.clone(), shared.clone());

    let entry = store.entries.entry(key).or_default();
    if entry.data.is_none() {
      entry.status = QueryStatus::Loading;
    }

    shared.boxed()
  }

  /// Build the future that performs the fetch and records its outcome.
  fn run<F, Fut>(
    &self,
    key: K,
    fetcher: F,
    options: QueryOptions,
  ) -> BoxFuture<'static, FetchResult<T, E>>
  where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let store = Arc::clone(&self.store);

    async move {
      let mut attempt = 0;
      let result = loop {
        let outcome = fetcher().await;
        match outcome {
          Ok(data) => break Ok(Arc::new(data)),
          Err(err) if attempt < options.retry => {
            attempt += 1;
            warn!(
              query = %key.description(),
              attempt,
              error = %err,
              "fetch failed, retrying"
            );
            if !options.retry_delay.is_zero() {
              tokio::time::sleep(options.retry_delay).await;
            }
          }
          Err(err) => {
            warn!(query = %key.description(), error = %err, "fetch failed");
            break Err(Arc::new(err));
          }
        }
      };

      let mut guard = lock(&store);
      guard.in_flight.remove(&key);
      let entry = guard.entries.entry(key).or_default();
      match &result {
        Ok(data) => {
          entry.status = QueryStatus::Success;
          entry.data = Some(Arc::clone(data));
          entry.error = None;
          entry.updated_at = Some(chrono::Utc::now());
        }
        Err(err) => {
          entry.status = QueryStatus::Error;
          entry.error = Some(Arc::clone(err));
        }
      }
      drop(guard);

      result
    }
    .boxed()
  }
}
