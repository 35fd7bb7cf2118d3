//! Cache storage trait and in-memory implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::Instant;

use super::error::CacheError;

/// A single cached payload.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// The cached payload, kept as JSON so storage stays type-agnostic
  pub payload: Value,
  /// Monotonic store time, used for TTL checks
  pub stored_at: Instant,
  /// Wall-clock store time, reported to callers
  pub cached_at: DateTime<Utc>,
}

impl CachedEntry {
  fn new(payload: Value) -> Self {
    Self {
      payload,
      stored_at: Instant::now(),
      cached_at: Utc::now(),
    }
  }
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get the entry stored under `key`, regardless of its age.
  fn get_entry(&self, key: &str) -> Result<Option<CachedEntry>, CacheError>;

  /// Store a payload under `key`, replacing any previous entry.
  fn store_entry(&self, key: &str, payload: Value) -> Result<(), CacheError>;

  /// Remove the entry under `key`. Removing a missing key is not an error.
  fn remove_entry(&self, key: &str) -> Result<(), CacheError>;
}

impl CacheStorage for Box<dyn CacheStorage> {
  fn get_entry(&self, key: &str) -> Result<Option<CachedEntry>, CacheError> {
    (**self).get_entry(key)
  }

  fn store_entry(&self, key: &str, payload: Value) -> Result<(), CacheError> {
    (**self).store_entry(key, payload)
  }

  fn remove_entry(&self, key: &str) -> Result<(), CacheError> {
    (**self).remove_entry(key)
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get_entry(&self, _key: &str) -> Result<Option<CachedEntry>, CacheError> {
    Ok(None) // Always miss
  }

  fn store_entry(&self, _key: &str, _payload: Value) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  fn remove_entry(&self, _key: &str) -> Result<(), CacheError> {
    Ok(())
  }
}

/// Process-local storage. Entries vanish when the storage is dropped.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CachedEntry>>, CacheError> {
    self.entries.lock().map_err(|_| CacheError::LockPoisoned)
  }

  /// Number of entries currently held, expired or not. Counts through a
  /// poisoned lock.
  #[cfg(test)]
  pub fn len(&self) -> usize {
    match self.entries.lock() {
      Ok(entries) => entries.len(),
      Err(poisoned) => poisoned.into_inner().len(),
    }
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl CacheStorage for MemoryStorage {
  fn get_entry(&self, key: &str) -> Result<Option<CachedEntry>, CacheError> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn store_entry(&self, key: &str, payload: Value) -> Result<(), CacheError> {
    self
      .lock()?
      .insert(key.to_string(), CachedEntry::new(payload));
    Ok(())
  }

  fn remove_entry(&self, key: &str) -> Result<(), CacheError> {
    self.lock()?.remove(key);
    Ok(())
  }
}
