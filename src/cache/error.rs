use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache lock poisoned")]
  LockPoisoned,

  #[error("failed to serialize {entity_type} for caching: {source}")]
  Serialize {
    entity_type: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("cached {entity_type} payload is corrupt: {source}")]
  Corrupt {
    entity_type: &'static str,
    #[source]
    source: serde_json::Error,
  },
}
