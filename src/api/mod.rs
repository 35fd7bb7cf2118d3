//! Backend API module.
//! Typed client, transport seam and caching wrapper for the well-being REST API.

pub mod cache;
pub mod cached_client;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use cached_client::CachedApiClient;
pub use error::ApiError;
pub use types::*;
