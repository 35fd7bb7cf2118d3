//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::error::CacheError;
use super::storage::CacheStorage;
use super::traits::{CacheResult, Cacheable, QueryKey};

/// Default time-to-live for cached lists.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the typed client and the transport. Reads are
/// cache-first; an entry is fresh while `now - stored_at < ttl`. Expiry is
/// checked lazily on the next read, there is no background refresh.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  ttl: Duration,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      ttl: DEFAULT_TTL,
    }
  }

  /// Set the time-to-live for cached data.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  #[cfg(test)]
  pub fn storage(&self) -> &S {
    &self.storage
  }

  fn is_fresh(&self, stored_at: Instant) -> bool {
    Instant::now().saturating_duration_since(stored_at) < self.ttl
  }

  /// Look up a fresh entry. Expired entries are removed and reported as a miss.
  fn lookup<T: Cacheable>(&self, key: &str) -> Result<Option<(Vec<T>, DateTime<Utc>)>, CacheError> {
    let Some(entry) = self.storage.get_entry(key)? else {
      return Ok(None);
    };

    if !self.is_fresh(entry.stored_at) {
      self.storage.remove_entry(key)?;
      return Ok(None);
    }

    let data = serde_json::from_value(entry.payload).map_err(|source| CacheError::Corrupt {
      entity_type: T::entity_type(),
      source,
    })?;
    Ok(Some((data, entry.cached_at)))
  }

  fn store<T: Cacheable>(&self, key: &str, data: &[T]) -> Result<(), CacheError> {
    let payload = serde_json::to_value(data).map_err(|source| CacheError::Serialize {
      entity_type: T::entity_type(),
      source,
    })?;
    self.storage.store_entry(key, payload)
  }

  /// Fetch a list with cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately without calling `fetcher`
  /// 2. If expired or missing, run `fetcher`
  /// 3. On success, store the result; on failure, propagate the error and
  ///    leave the cache untouched
  pub async fn fetch_list<T, K, F, Fut, E>(
    &self,
    key: &K,
    fetcher: F,
  ) -> Result<CacheResult<Vec<T>>, E>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
    E: From<CacheError>,
  {
    let cache_key = key.cache_key();

    if let Some((data, cached_at)) = self.lookup::<T>(&cache_key)? {
      debug!(key = %cache_key, entries = data.len(), "cache hit for {}", key.description());
      return Ok(CacheResult::from_cache(data, cached_at));
    }

    debug!(key = %cache_key, "cache miss for {}", key.description());
    let data = fetcher().await?;
    self.store(&cache_key, &data)?;
    Ok(CacheResult::from_network(data))
  }

  /// Drop the entry for `key` so the next read goes to the network.
  pub fn invalidate<K: QueryKey>(&self, key: &K) -> Result<(), CacheError> {
    debug!(key = %key.cache_key(), "invalidating {}", key.description());
    self.storage.remove_entry(&key.cache_key())
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}
