//! In-memory response cache with lazy TTL expiry.
//!
//! This module is backend-agnostic:
//! - Caches whole lists under one key per resource
//! - Treats an entry older than the TTL as absent and drops it on the next read
//! - Never serves stale data; a failed refresh propagates the error
//! - Supports explicit invalidation for write-through consistency

mod error;
mod layer;
mod storage;
mod traits;

pub use error::CacheError;
pub use layer::CacheLayer;
pub use storage::{CacheStorage, MemoryStorage, NoopStorage};
pub use traits::{CacheResult, CacheSource, Cacheable, QueryKey};
