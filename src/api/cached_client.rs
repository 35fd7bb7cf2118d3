//! Cached backend client that wraps ApiClient with transparent caching.

use tracing::info;

use crate::cache::{CacheLayer, CacheResult, CacheStorage, MemoryStorage, NoopStorage};
use crate::config::Config;

use super::cache::ResourceKey;
use super::client::ApiClient;
use super::error::Result;
use super::transport::{HttpTransport, Transport};
use super::types::{
  Department, Employee, MoodEntry, MoodEntryId, MoodEntryInput, WellBeingAlert,
};

/// Backend client with transparent caching support.
///
/// This wraps the underlying ApiClient and provides the same API. List reads
/// are served from the cache while fresh; every mood-entry write drops the
/// cached mood-entry list before the request is sent.
///
/// Concurrent readers of the same expired key are not coalesced: each one
/// issues its own request.
pub struct CachedApiClient<T: Transport = HttpTransport, S: CacheStorage = Box<dyn CacheStorage>> {
  inner: ApiClient<T>,
  cache: CacheLayer<S>,
}

impl<T: Transport, S: CacheStorage> Clone for CachedApiClient<T, S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      cache: self.cache.clone(),
    }
  }
}

impl CachedApiClient {
  /// Create a new cached client from configuration.
  pub fn from_config(config: &Config) -> color_eyre::Result<Self> {
    let transport = HttpTransport::new()
      .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;
    let inner = ApiClient::new(config.api.url()?, transport)?
      .with_timeout(config.api.timeout());

    let storage: Box<dyn CacheStorage> = if config.cache.enabled {
      Box::new(MemoryStorage::new())
    } else {
      Box::new(NoopStorage)
    };
    let cache = CacheLayer::new(storage).with_ttl(config.cache.ttl());

    Ok(Self::new(inner, cache))
  }
}

impl<T: Transport, S: CacheStorage> CachedApiClient<T, S> {
  pub fn new(inner: ApiClient<T>, cache: CacheLayer<S>) -> Self {
    Self { inner, cache }
  }

  /// Get all mood entries with caching.
  pub async fn list_mood_entries(&self) -> Result<Vec<MoodEntry>> {
    Ok(self.list_mood_entries_with_source().await?.data)
  }

  /// Like `list_mood_entries`, but reports whether the list came from the cache.
  pub async fn list_mood_entries_with_source(&self) -> Result<CacheResult<Vec<MoodEntry>>> {
    self
      .cache
      .fetch_list(&ResourceKey::MoodEntries, || self.inner.list_mood_entries())
      .await
  }

  /// Get all employees with caching.
  pub async fn list_employees(&self) -> Result<Vec<Employee>> {
    let result = self
      .cache
      .fetch_list(&ResourceKey::Employees, || self.inner.list_employees())
      .await?;

    Ok(result.data)
  }

  /// Get all departments with caching.
  pub async fn list_departments(&self) -> Result<Vec<Department>> {
    let result = self
      .cache
      .fetch_list(&ResourceKey::Departments, || self.inner.list_departments())
      .await?;

    Ok(result.data)
  }

  /// Get all alerts with caching.
  pub async fn list_alerts(&self) -> Result<Vec<WellBeingAlert>> {
    let result = self
      .cache
      .fetch_list(&ResourceKey::Alerts, || self.inner.list_alerts())
      .await?;

    Ok(result.data)
  }

  /// Create a mood entry (write operation, invalidates the entry list).
  pub async fn create_mood_entry(&self, input: &MoodEntryInput) -> Result<MoodEntry> {
    self.cache.invalidate(&ResourceKey::MoodEntries)?;
    let created = self.inner.create_mood_entry(input).await?;
    info!(id = created.id, employee_id = created.employee_id, "created mood entry");
    Ok(created)
  }

  /// Update a mood entry (write operation, invalidates the entry list).
  pub async fn update_mood_entry(&self, id: MoodEntryId, input: &MoodEntryInput) -> Result<MoodEntry> {
    self.cache.invalidate(&ResourceKey::MoodEntries)?;
    let updated = self.inner.update_mood_entry(id, input).await?;
    info!(id, "updated mood entry");
    Ok(updated)
  }

  /// Delete a mood entry (write operation, invalidates the entry list).
  pub async fn delete_mood_entry(&self, id: MoodEntryId) -> Result<bool> {
    self.cache.invalidate(&ResourceKey::MoodEntries)?;
    let deleted = self.inner.delete_mood_entry(id).await?;
    info!(id, deleted, "deleted mood entry");
    Ok(deleted)
  }
}
